use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{abort, ConflictableTransactionError, TransactionError};
use sled::Transactional;

use crate::progression::types::Program;
use crate::store::keys;
use crate::store::operations::completions::CompletionRecord;
use crate::store::{Store, StoreError};

/// 每个用户每个项目一条的进度计数（天数或关卡），从 1 开始，只增不减
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressCounter {
    pub user_id: String,
    pub program: Program,
    pub value: u64,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    fn decode_counter(raw: &[u8], key: &str) -> Result<ProgressCounter, StoreError> {
        let counter: ProgressCounter = Self::deserialize(raw)
            .map_err(|e| StoreError::Validation(format!("corrupt counter {}: {}", key, e)))?;
        if counter.value == 0 {
            return Err(StoreError::Validation(format!(
                "counter {} holds non-positive value",
                key
            )));
        }
        Ok(counter)
    }

    pub fn get_counter(
        &self,
        user_id: &str,
        program: Program,
    ) -> Result<Option<ProgressCounter>, StoreError> {
        let key = keys::counter_key(user_id, program.as_str())?;
        match self.progress_counters.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::decode_counter(&raw, &key)?)),
            None => Ok(None),
        }
    }

    /// 首次读取时创建计数（值为 1）。使用 CAS 保证并发创建只落一份，
    /// 输掉竞争的一方直接采用已存在的记录。
    pub fn get_or_init_counter(
        &self,
        user_id: &str,
        program: Program,
        now: DateTime<Utc>,
    ) -> Result<ProgressCounter, StoreError> {
        let key = keys::counter_key(user_id, program.as_str())?;
        if let Some(raw) = self.progress_counters.get(key.as_bytes())? {
            return Self::decode_counter(&raw, &key);
        }

        let initial = ProgressCounter {
            user_id: user_id.to_string(),
            program,
            value: 1,
            started_at: now,
            updated_at: now,
        };
        let cas_result = self.progress_counters.compare_and_swap(
            key.as_bytes(),
            None::<&[u8]>,
            Some(Self::serialize(&initial)?),
        )?;

        match cas_result {
            Ok(()) => {
                tracing::debug!(user_id, program = %program, "Progress counter created");
                Ok(initial)
            }
            Err(existing) => match existing.current {
                Some(raw) => Self::decode_counter(&raw, &key),
                None => Err(StoreError::conflict("progress_counter", &key)),
            },
        }
    }

    /// 条件推进：仅当存储值仍等于 `expected` 时写入 `expected + 1`。
    ///
    /// 不重试；值已变化或 CAS 落败都返回 `Conflict`，双击只会推进一次。
    pub fn advance_counter(
        &self,
        user_id: &str,
        program: Program,
        expected: u64,
        now: DateTime<Utc>,
    ) -> Result<ProgressCounter, StoreError> {
        let key = keys::counter_key(user_id, program.as_str())?;
        let raw = self
            .progress_counters
            .get(key.as_bytes())?
            .ok_or_else(|| StoreError::not_found("progress_counter", &key))?;
        let current = Self::decode_counter(&raw, &key)?;

        if current.value != expected {
            tracing::info!(
                user_id,
                program = %program,
                expected,
                actual = current.value,
                "Stale progress advance rejected"
            );
            return Err(StoreError::conflict("progress_counter", &key));
        }

        let next = ProgressCounter {
            value: expected + 1,
            updated_at: now,
            ..current
        };
        let cas_result = self.progress_counters.compare_and_swap(
            key.as_bytes(),
            Some(&raw),
            Some(Self::serialize(&next)?),
        )?;

        match cas_result {
            Ok(()) => Ok(next),
            Err(_) => Err(StoreError::conflict("progress_counter", &key)),
        }
    }

    /// 把计数从 `record.unit` 推进一格并写入该单元的完成记录，两棵树同一事务提交。
    ///
    /// 计数已变化或该单元已有记录时返回 `Conflict`，两边都不落盘。
    pub fn advance_counter_with_completion(
        &self,
        record: &CompletionRecord,
        now: DateTime<Utc>,
    ) -> Result<ProgressCounter, StoreError> {
        let program = record.program.as_str();
        let key = keys::counter_key(&record.user_id, program)?;
        let completion_key = keys::completion_key(&record.user_id, program, record.unit)?;
        let record_bytes = Self::serialize(record)?;
        let expected = record.unit;

        let result = (&self.progress_counters, &self.completions).transaction(
            |(tx_counters, tx_completions)| {
                let raw = tx_counters.get(key.as_bytes())?.ok_or_else(|| {
                    ConflictableTransactionError::Abort(StoreError::not_found(
                        "progress_counter",
                        &key,
                    ))
                })?;
                let current =
                    Self::decode_counter(&raw, &key).map_err(ConflictableTransactionError::Abort)?;
                if current.value != expected {
                    return abort(StoreError::conflict("progress_counter", &key));
                }
                if tx_completions.get(completion_key.as_bytes())?.is_some() {
                    return abort(StoreError::conflict("completion", &completion_key));
                }

                let next = ProgressCounter {
                    value: expected + 1,
                    updated_at: now,
                    ..current
                };
                let next_bytes =
                    Self::serialize(&next).map_err(ConflictableTransactionError::Abort)?;
                tx_counters.insert(key.as_bytes(), next_bytes)?;
                tx_completions.insert(completion_key.as_bytes(), record_bytes.as_slice())?;
                Ok(next)
            },
        );

        result.map_err(|error: TransactionError<StoreError>| match error {
            TransactionError::Abort(store_error) => {
                if matches!(store_error, StoreError::Conflict { .. }) {
                    tracing::info!(
                        user_id = %record.user_id,
                        program = %record.program,
                        expected,
                        "Stale completion rejected"
                    );
                }
                store_error
            }
            TransactionError::Storage(storage_error) => StoreError::Sled(storage_error),
        })
    }
}
