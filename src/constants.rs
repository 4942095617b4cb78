/// CAS（Compare-And-Swap）操作最大重试次数
pub const MAX_CAS_RETRIES: u32 = 20;

/// 文案缺失时回退的语言
pub const DEFAULT_LOCALE: &str = "en";

/// 每条内容至少需要的语言版本数
pub const MIN_LOCALES_PER_ITEM: usize = 2;

/// 灵修连载在存储中的名字
pub const DEVOTIONAL_SERIES: &str = "devotional";

/// 上游网关注入的用户标识头
pub const USER_ID_HEADER: &str = "x-user-id";

/// 用户标识最大长度
pub const MAX_USER_ID_LEN: usize = 64;
