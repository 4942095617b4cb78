use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_CAS_RETRIES;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// 定时解锁连载的进度：`started_at` 只写一次，`position` 为当前查看的单元
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesProgress {
    pub user_id: String,
    pub series: String,
    pub started_at: DateTime<Utc>,
    pub position: u32,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    fn decode_series(raw: &[u8], key: &str) -> Result<SeriesProgress, StoreError> {
        let progress: SeriesProgress = Self::deserialize(raw)
            .map_err(|e| StoreError::Validation(format!("corrupt series record {}: {}", key, e)))?;
        if progress.position == 0 {
            return Err(StoreError::Validation(format!(
                "series record {} has position 0",
                key
            )));
        }
        Ok(progress)
    }

    pub fn get_series_progress(
        &self,
        user_id: &str,
        series: &str,
    ) -> Result<Option<SeriesProgress>, StoreError> {
        let key = keys::series_key(user_id, series)?;
        match self.series_progress.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::decode_series(&raw, &key)?)),
            None => Ok(None),
        }
    }

    /// 不存在时以 `now` 开始连载。两台设备同时开始时只有一方写入成功，
    /// 另一方读取并沿用获胜方的开始时间。
    pub fn start_series_if_absent(
        &self,
        user_id: &str,
        series: &str,
        now: DateTime<Utc>,
    ) -> Result<SeriesProgress, StoreError> {
        let key = keys::series_key(user_id, series)?;
        if let Some(raw) = self.series_progress.get(key.as_bytes())? {
            return Self::decode_series(&raw, &key);
        }

        let fresh = SeriesProgress {
            user_id: user_id.to_string(),
            series: series.to_string(),
            started_at: now,
            position: 1,
            updated_at: now,
        };
        let cas_result = self.series_progress.compare_and_swap(
            key.as_bytes(),
            None::<&[u8]>,
            Some(Self::serialize(&fresh)?),
        )?;

        match cas_result {
            Ok(()) => {
                tracing::info!(user_id, series, started_at = %now, "Series started");
                Ok(fresh)
            }
            Err(existing) => match existing.current {
                Some(raw) => Self::decode_series(&raw, &key),
                None => Err(StoreError::conflict("series_progress", &key)),
            },
        }
    }

    /// 更新查看位置，保留原开始时间。解锁范围由调用方先行校验。
    pub fn set_series_position(
        &self,
        user_id: &str,
        series: &str,
        position: u32,
        now: DateTime<Utc>,
    ) -> Result<SeriesProgress, StoreError> {
        if position == 0 {
            return Err(StoreError::Validation("series position starts at 1".to_string()));
        }
        let key = keys::series_key(user_id, series)?;

        for _ in 0..MAX_CAS_RETRIES {
            let raw = self
                .series_progress
                .get(key.as_bytes())?
                .ok_or_else(|| StoreError::not_found("series_progress", &key))?;
            let current = Self::decode_series(&raw, &key)?;
            if current.position == position {
                return Ok(current);
            }

            let next = SeriesProgress {
                position,
                updated_at: now,
                ..current
            };
            let cas_result = self.series_progress.compare_and_swap(
                key.as_bytes(),
                Some(&raw),
                Some(Self::serialize(&next)?),
            )?;
            if cas_result.is_ok() {
                return Ok(next);
            }
        }

        Err(StoreError::CasRetryExhausted {
            entity: "series_progress".to_string(),
            key,
            attempts: MAX_CAS_RETRIES,
        })
    }
}
