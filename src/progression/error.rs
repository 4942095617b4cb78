use chrono::{DateTime, Utc};
use thiserror::Error;

/// 引擎错误。全部是对相同输入的确定性结果，引擎内不做任何重试。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// 调用方错误：空答案、未知维度、非正的等级等
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 目录缺口：目标维度的内容池为空
    #[error("content pool exhausted for category {category}")]
    PoolExhausted { category: String },

    /// 请求的单元尚未解锁；调用方据 `next_unlock_at` 展示倒计时
    #[error("unit {requested} is locked ({unlocked} unlocked)")]
    Locked {
        requested: u32,
        unlocked: u32,
        next_unlock_at: Option<DateTime<Utc>>,
    },
}

impl EngineError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
