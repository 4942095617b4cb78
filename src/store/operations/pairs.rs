use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{abort, ConflictableTransactionError, TransactionError};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// 用户与伴侣的关联，双方各存一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairLink {
    pub user_id: String,
    pub partner_id: String,
    pub linked_at: DateTime<Utc>,
}

impl Store {
    pub fn set_partner(
        &self,
        user_id: &str,
        partner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PairLink, StoreError> {
        if user_id == partner_id {
            return Err(StoreError::Validation("cannot pair with yourself".to_string()));
        }
        let user_key = keys::pair_key(user_id)?;
        let partner_key = keys::pair_key(partner_id)?;

        let link = PairLink {
            user_id: user_id.to_string(),
            partner_id: partner_id.to_string(),
            linked_at: now,
        };
        let reverse = PairLink {
            user_id: partner_id.to_string(),
            partner_id: user_id.to_string(),
            linked_at: now,
        };

        let link_bytes = Self::serialize(&link)?;
        let reverse_bytes = Self::serialize(&reverse)?;

        // 检查与写入在同一事务内；任一方已和第三人关联时拒绝，需先解除
        self.pairs
            .transaction(|tx| {
                for (key, id, other) in [
                    (&user_key, user_id, partner_id),
                    (&partner_key, partner_id, user_id),
                ] {
                    if let Some(raw) = tx.get(key.as_bytes())? {
                        let existing: PairLink =
                            Self::deserialize(&raw).map_err(ConflictableTransactionError::Abort)?;
                        if existing.partner_id != other {
                            return abort(StoreError::conflict("pair", id));
                        }
                    }
                }
                tx.insert(user_key.as_bytes(), link_bytes.as_slice())?;
                tx.insert(partner_key.as_bytes(), reverse_bytes.as_slice())?;
                Ok(())
            })
            .map_err(map_transaction_error)?;
        Ok(link)
    }

    pub fn get_partner(&self, user_id: &str) -> Result<Option<PairLink>, StoreError> {
        let key = keys::pair_key(user_id)?;
        match self.pairs.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// 解除双方关联；返回是否存在关联
    pub fn clear_partner(&self, user_id: &str) -> Result<bool, StoreError> {
        let user_key = keys::pair_key(user_id)?;
        self.pairs
            .transaction(|tx| {
                let Some(raw) = tx.remove(user_key.as_bytes())? else {
                    return Ok(false);
                };
                let link: PairLink =
                    Self::deserialize(&raw).map_err(ConflictableTransactionError::Abort)?;
                let partner_key =
                    keys::pair_key(&link.partner_id).map_err(ConflictableTransactionError::Abort)?;
                if let Some(reverse_raw) = tx.get(partner_key.as_bytes())? {
                    let reverse: PairLink = Self::deserialize(&reverse_raw)
                        .map_err(ConflictableTransactionError::Abort)?;
                    if reverse.partner_id == user_id {
                        tx.remove(partner_key.as_bytes())?;
                    }
                }
                Ok(true)
            })
            .map_err(map_transaction_error)
    }
}

fn map_transaction_error(error: TransactionError<StoreError>) -> StoreError {
    match error {
        TransactionError::Abort(store_error) => store_error,
        TransactionError::Storage(storage_error) => StoreError::Sled(storage_error),
    }
}
