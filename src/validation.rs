/// 公共验证函数模块
/// 网关传入的用户标识与查询参数校验，供提取器和路由共用。
use crate::constants::{DEFAULT_LOCALE, MAX_USER_ID_LEN};

/// 验证用户标识：1-64 字符，只允许 ASCII 字母、数字、下划线和连字符
pub fn validate_user_id(user_id: &str) -> Result<(), &'static str> {
    if user_id.is_empty() {
        return Err("用户标识不能为空");
    }
    if user_id.len() > MAX_USER_ID_LEN {
        return Err("用户标识长度不能超过64个字符");
    }
    if !user_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err("用户标识只能包含字母、数字、下划线和连字符");
    }
    Ok(())
}

/// 规范化语言代码：小写，只保留主语言部分（"es-MX" -> "es"），非法时回退默认语言
pub fn normalize_locale(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_LOCALE.to_string();
    };
    let primary = raw
        .split(['-', '_'])
        .next()
        .unwrap_or(DEFAULT_LOCALE)
        .to_ascii_lowercase();
    if (2..=3).contains(&primary.len()) && primary.bytes().all(|b| b.is_ascii_lowercase()) {
        primary
    } else {
        DEFAULT_LOCALE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_accepts_gateway_ids() {
        assert!(validate_user_id("u1").is_ok());
        assert!(validate_user_id("9f1c-44_ab").is_ok());
        assert!(validate_user_id(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn user_id_rejects_bad_values() {
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id(&"a".repeat(65)).is_err());
        assert!(validate_user_id("ana:ben").is_err());
        assert!(validate_user_id("ana ben").is_err());
        assert!(validate_user_id("用户").is_err());
    }

    #[test]
    fn locale_is_normalized() {
        assert_eq!(normalize_locale(None), "en");
        assert_eq!(normalize_locale(Some("es-MX")), "es");
        assert_eq!(normalize_locale(Some(" PT_br ")), "pt");
        assert_eq!(normalize_locale(Some("")), "en");
        assert_eq!(normalize_locale(Some("e1")), "en");
    }
}
