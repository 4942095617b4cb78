use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progression::types::{Category, PreferenceProfile, Program};
use crate::store::keys;
use crate::store::{Store, StoreError};

/// 持久化的测验画像，重测时整体覆盖
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord<C> {
    pub user_id: String,
    pub program: Program,
    pub profile: PreferenceProfile<C>,
    pub taken_at: DateTime<Utc>,
}

impl Store {
    pub fn put_profile<C: Category>(&self, record: &ProfileRecord<C>) -> Result<(), StoreError> {
        if record.program != C::PROGRAM {
            return Err(StoreError::Validation(format!(
                "profile for {} stored under {}",
                C::PROGRAM,
                record.program
            )));
        }
        let key = keys::profile_key(&record.user_id, C::PROGRAM.as_str())?;
        self.profiles
            .insert(key.as_bytes(), Self::serialize(record)?)?;
        Ok(())
    }

    /// 读取并校验画像；结构损坏或排名不一致时直接报错，而不是返回错误排名
    pub fn get_profile<C: Category>(
        &self,
        user_id: &str,
    ) -> Result<Option<ProfileRecord<C>>, StoreError> {
        let key = keys::profile_key(user_id, C::PROGRAM.as_str())?;
        let Some(raw) = self.profiles.get(key.as_bytes())? else {
            return Ok(None);
        };

        let record: ProfileRecord<C> = Self::deserialize(&raw).map_err(|e| {
            tracing::warn!(user_id, program = %C::PROGRAM, error = %e, "Unreadable profile record");
            StoreError::Validation(format!("corrupt {} profile for {}", C::PROGRAM, user_id))
        })?;

        if record.program != C::PROGRAM || record.user_id != user_id {
            return Err(StoreError::Validation(format!(
                "profile record under {} belongs to {}/{}",
                key, record.user_id, record.program
            )));
        }
        record.profile.validate().map_err(|reason| {
            tracing::warn!(user_id, program = %C::PROGRAM, %reason, "Invalid profile record");
            StoreError::Validation(format!(
                "invalid {} profile for {}: {}",
                C::PROGRAM,
                user_id,
                reason
            ))
        })?;

        Ok(Some(record))
    }
}
