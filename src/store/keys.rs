use crate::store::StoreError;

const SEPARATOR: char = ':';

/// 键段不能为空，也不能包含分隔符，否则前缀扫描会串到别的用户
fn segment(value: &str) -> Result<&str, StoreError> {
    if value.is_empty() || value.contains(SEPARATOR) {
        return Err(StoreError::Validation(format!(
            "invalid key segment '{}'",
            value
        )));
    }
    Ok(value)
}

pub fn profile_key(user_id: &str, program: &str) -> Result<String, StoreError> {
    Ok(format!("{}:{}", segment(user_id)?, segment(program)?))
}

pub fn counter_key(user_id: &str, program: &str) -> Result<String, StoreError> {
    Ok(format!("{}:{}", segment(user_id)?, segment(program)?))
}

pub fn series_key(user_id: &str, series: &str) -> Result<String, StoreError> {
    Ok(format!("{}:{}", segment(user_id)?, segment(series)?))
}

pub fn completion_key(user_id: &str, program: &str, unit: u64) -> Result<String, StoreError> {
    Ok(format!(
        "{}:{}:{:020}",
        segment(user_id)?,
        segment(program)?,
        unit
    ))
}

pub fn completion_prefix(user_id: &str, program: &str) -> Result<String, StoreError> {
    Ok(format!("{}:{}:", segment(user_id)?, segment(program)?))
}

pub fn pair_key(user_id: &str) -> Result<String, StoreError> {
    Ok(segment(user_id)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_keys_sort_numerically() {
        let k2 = completion_key("u1", "devotional", 2).unwrap();
        let k10 = completion_key("u1", "devotional", 10).unwrap();
        assert!(k2 < k10);
        assert!(k2.starts_with(&completion_prefix("u1", "devotional").unwrap()));
    }

    #[test]
    fn separator_in_segment_is_rejected() {
        assert!(matches!(
            profile_key("u:1", "love_language"),
            Err(StoreError::Validation(_))
        ));
        assert!(pair_key("").is_err());
    }
}
