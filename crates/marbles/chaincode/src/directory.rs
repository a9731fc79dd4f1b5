//! Directory queries.
//!
//! The ledger has no secondary indexes, so every cross-cutting query is a
//! full scan of the configured key range followed by a filter. Records that
//! fail to decode are skipped with a warning; a failing store aborts the scan.

use crate::config::{ChaincodeConfig, KeyRange};
use crate::error::{ChaincodeError, ChaincodeResult};
use marbles_ledger::LedgerStub;
use marbles_types::{LedgerRecord, Marble, ReviewStatus, StageKind, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One historical version of a marble. Deletions carry an empty marble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "txId")]
    pub tx_id: String,
    pub value: Marble,
}

/// One raw ledger entry returned by a range query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRecord {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Record")]
    pub record: serde_json::Value,
}

/// Enabled users plus a selection of marbles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Everything {
    pub owners: Vec<User>,
    pub marbles: Vec<Marble>,
}

/// Read-only queries over one transaction's view of the ledger.
pub struct Directory<'a> {
    stub: &'a dyn LedgerStub,
    config: &'a ChaincodeConfig,
}

impl<'a> Directory<'a> {
    pub fn new(stub: &'a dyn LedgerStub, config: &'a ChaincodeConfig) -> Self {
        Self { stub, config }
    }

    /// Every marble, in key order.
    pub fn all_marbles(&self) -> ChaincodeResult<Vec<Marble>> {
        self.scan(&self.config.marble_range)
    }

    /// Every enabled user, in key order.
    pub fn enabled_users(&self) -> ChaincodeResult<Vec<User>> {
        let users: Vec<User> = self.scan(&self.config.user_range)?;
        Ok(users.into_iter().filter(|user| user.enabled).collect())
    }

    /// The first enabled user of `company`, in key order.
    pub fn find_user_by_company(&self, company: &str) -> ChaincodeResult<User> {
        self.enabled_users()?
            .into_iter()
            .find(|user| user.company == company)
            .ok_or_else(|| {
                ChaincodeError::NotFound(format!("no enabled user for company '{company}'"))
            })
    }

    /// Marbles owned by `user_id` or naming it as an actor on one of the
    /// leading `reviewer_stage_depth` stages. Each marble appears once.
    pub fn marbles_relevant_to(&self, user_id: &str) -> ChaincodeResult<Vec<Marble>> {
        let depth = self.config.reviewer_stage_depth;
        Ok(self
            .all_marbles()?
            .into_iter()
            .filter(|marble| marble.is_owned_by(user_id) || marble.has_reviewer(user_id, depth))
            .collect())
    }

    /// Relevant marbles whose `stage` currently has `status`.
    pub fn marbles_by_stage_status(
        &self,
        user_id: &str,
        stage: StageKind,
        status: ReviewStatus,
    ) -> ChaincodeResult<Vec<Marble>> {
        Ok(self
            .marbles_relevant_to(user_id)?
            .into_iter()
            .filter(|marble| marble.stage(stage).status == status)
            .collect())
    }

    /// Enabled users and either all marbles or, given a company, the marbles
    /// relevant to that company's first enabled user.
    pub fn everything(&self, company: Option<&str>) -> ChaincodeResult<Everything> {
        let marbles = match company {
            Some(company) => {
                let user = self.find_user_by_company(company)?;
                self.marbles_relevant_to(&user.id)?
            }
            None => self.all_marbles()?,
        };
        Ok(Everything {
            owners: self.enabled_users()?,
            marbles,
        })
    }

    /// Every committed version of `marble_id`, in ledger history order.
    pub fn history(&self, marble_id: &str) -> ChaincodeResult<Vec<HistoryRecord>> {
        let mut history = Vec::new();
        for modification in self.stub.get_history_for_key(marble_id)? {
            let modification = modification?;
            let value = if modification.is_delete {
                Marble::default()
            } else {
                Marble::decode_lossy(modification.value.as_deref())
            };
            history.push(HistoryRecord {
                tx_id: modification.tx_id,
                value,
            });
        }
        debug!(marble_id, versions = history.len(), "history loaded");
        Ok(history)
    }

    /// Raw records in `[start, end)`. Non-JSON values are returned as strings.
    pub fn range(&self, start: &str, end: &str) -> ChaincodeResult<Vec<RangeRecord>> {
        let mut records = Vec::new();
        for entry in self.stub.get_state_by_range(start, end)? {
            let entry = entry?;
            let record = serde_json::from_slice(&entry.value).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&entry.value).into_owned())
            });
            records.push(RangeRecord {
                key: entry.key,
                record,
            });
        }
        Ok(records)
    }

    fn scan<T: LedgerRecord>(&self, range: &KeyRange) -> ChaincodeResult<Vec<T>> {
        let mut records = Vec::new();
        for entry in self.stub.get_state_by_range(&range.start, &range.end)? {
            let entry = entry?;
            match T::decode(&entry.value) {
                Ok(record) if record.is_stored_under(&entry.key) => records.push(record),
                Ok(_) => {
                    debug!(key = %entry.key, doc_type = T::DOC_TYPE, "skipping foreign record");
                }
                Err(err) => {
                    warn!(key = %entry.key, error = %err, "skipping undecodable record");
                }
            }
        }
        debug!(
            start = %range.start,
            end = %range.end,
            doc_type = T::DOC_TYPE,
            count = records.len(),
            "range scanned"
        );
        Ok(records)
    }
}
