//! 轮换选择：按计数器确定性地从目录中挑一条内容，偏向画像中排名靠前的维度。
//!
//! 只保证模运算公式本身：同一个计数器永远得到同一条内容，连续
//! `pool.len()` 个计数器覆盖整个池。哪天出现哪条没有额外编排。

use serde::Serialize;

use crate::catalog::{Catalog, ContentItem};
use crate::progression::config::RotationConfig;
use crate::progression::error::EngineError;
use crate::progression::types::{Category, PreferenceProfile};

const SPLIT_MODULUS: u64 = 10;

/// 本次计数器落到的目标维度。无画像时使用默认维度。
pub fn target_category<C: Category>(
    counter: u64,
    profile: Option<&PreferenceProfile<C>>,
    config: &RotationConfig<C>,
) -> C {
    let Some(profile) = profile else {
        return config.default_category;
    };
    let Some(primary) = profile.primary() else {
        return config.default_category;
    };

    if counter % SPLIT_MODULUS >= u64::from(config.secondary_threshold) {
        profile.secondary().unwrap_or(primary)
    } else {
        primary
    }
}

/// 池内取模索引
pub fn pick_from_pool<C: Category>(
    counter: u64,
    category: C,
    pool: &[ContentItem<C>],
) -> Result<&ContentItem<C>, EngineError> {
    if pool.is_empty() {
        return Err(EngineError::PoolExhausted {
            category: category.key().to_string(),
        });
    }
    let index = (counter % pool.len() as u64) as usize;
    Ok(&pool[index])
}

/// 严格选择：目标维度的池为空时直接返回 `PoolExhausted`，不做替换
pub fn select<'a, C: Category>(
    counter: u64,
    profile: Option<&PreferenceProfile<C>>,
    catalog: &'a Catalog<C>,
    config: &RotationConfig<C>,
) -> Result<&'a ContentItem<C>, EngineError> {
    let category = target_category(counter, profile, config);
    pick_from_pool(counter, category, catalog.pool(category))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection<'a, C> {
    pub item: &'a ContentItem<C>,
    pub target: C,
    pub fell_back: bool,
}

/// 可恢复的选择：目标池为空时退回默认维度的池，默认池也为空才报错
pub fn select_or_default<'a, C: Category>(
    counter: u64,
    profile: Option<&PreferenceProfile<C>>,
    catalog: &'a Catalog<C>,
    config: &RotationConfig<C>,
) -> Result<Selection<'a, C>, EngineError> {
    let target = target_category(counter, profile, config);
    match pick_from_pool(counter, target, catalog.pool(target)) {
        Ok(item) => Ok(Selection {
            item,
            target,
            fell_back: false,
        }),
        Err(EngineError::PoolExhausted { .. }) if target != config.default_category => {
            tracing::warn!(
                program = %C::PROGRAM,
                category = target.key(),
                fallback = config.default_category.key(),
                "Content pool empty, falling back to default category"
            );
            let default = config.default_category;
            let item = pick_from_pool(counter, default, catalog.pool(default))?;
            Ok(Selection {
                item,
                target,
                fell_back: true,
            })
        }
        Err(e) => Err(e),
    }
}
