use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progression::types::Program;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// 一次"标记完成"的记录，每个 (用户, 项目, 单元) 至多一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub id: String,
    pub user_id: String,
    pub program: Program,
    pub unit: u64,
    pub item_id: String,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    pub fn new(
        user_id: &str,
        program: Program,
        unit: u64,
        item_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            program,
            unit,
            item_id: item_id.to_string(),
            completed_at,
        }
    }
}

impl Store {
    /// 仅在该单元尚无记录时写入，重复提交返回 `Conflict`
    pub fn record_completion(&self, record: &CompletionRecord) -> Result<(), StoreError> {
        let key = keys::completion_key(&record.user_id, record.program.as_str(), record.unit)?;
        let cas_result = self.completions.compare_and_swap(
            key.as_bytes(),
            None::<&[u8]>,
            Some(Self::serialize(record)?),
        )?;

        if cas_result.is_err() {
            return Err(StoreError::conflict("completion", &key));
        }
        Ok(())
    }

    pub fn is_completed(
        &self,
        user_id: &str,
        program: Program,
        unit: u64,
    ) -> Result<bool, StoreError> {
        let key = keys::completion_key(user_id, program.as_str(), unit)?;
        Ok(self.completions.contains_key(key.as_bytes())?)
    }

    /// 按单元升序列出
    pub fn list_completions(
        &self,
        user_id: &str,
        program: Program,
    ) -> Result<Vec<CompletionRecord>, StoreError> {
        let prefix = keys::completion_prefix(user_id, program.as_str())?;
        let mut records = Vec::new();
        for item in self.completions.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            records.push(Self::deserialize(&value)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_completion_is_rejected() {
        let store = Store::open_temporary().unwrap();
        let now = Utc::now();
        let first = CompletionRecord::new("u1", Program::Devotional, 2, "dev-02", now);
        store.record_completion(&first).unwrap();

        let again = CompletionRecord::new("u1", Program::Devotional, 2, "dev-02", now);
        assert!(matches!(
            store.record_completion(&again),
            Err(StoreError::Conflict { .. })
        ));
        assert!(store.is_completed("u1", Program::Devotional, 2).unwrap());
        assert!(!store.is_completed("u1", Program::Devotional, 3).unwrap());
    }

    #[test]
    fn listing_is_scoped_and_ordered() {
        let store = Store::open_temporary().unwrap();
        let now = Utc::now();
        for unit in [10, 2, 7] {
            store
                .record_completion(&CompletionRecord::new(
                    "u1",
                    Program::LoveLanguage,
                    unit,
                    "x",
                    now,
                ))
                .unwrap();
        }
        store
            .record_completion(&CompletionRecord::new("u10", Program::LoveLanguage, 1, "x", now))
            .unwrap();

        let units: Vec<u64> = store
            .list_completions("u1", Program::LoveLanguage)
            .unwrap()
            .into_iter()
            .map(|r| r.unit)
            .collect();
        assert_eq!(units, vec![2, 7, 10]);
    }
}
