use crate::LedgerResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// One committed modification of a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    /// `None` when the transaction deleted the key.
    pub value: Option<Vec<u8>>,
    pub is_delete: bool,
}

/// Ascending `(key, value)` scan results.
pub type StateIter<'a> = Box<dyn Iterator<Item = LedgerResult<KeyValue>> + 'a>;

/// Key modifications, oldest first.
pub type HistoryIter<'a> = Box<dyn Iterator<Item = LedgerResult<KeyModification>> + 'a>;

/// The chaincode's view of the ledger for a single transaction.
///
/// Implementations read committed state and buffer writes until the host
/// commits the transaction, so a failed invocation never leaves partial
/// effects behind.
pub trait LedgerStub {
    /// Identifier of the running transaction.
    fn tx_id(&self) -> &str;

    /// Timestamp assigned to the running transaction by its proposer.
    fn tx_timestamp(&self) -> DateTime<Utc>;

    /// Read a committed value; `Ok(None)` when the key does not exist.
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()>;

    fn del_state(&mut self, key: &str) -> LedgerResult<()>;

    /// Scan committed keys in `[start, end)`; an empty bound is open.
    fn get_state_by_range(&self, start: &str, end: &str) -> LedgerResult<StateIter<'_>>;

    /// Every committed modification of `key`, oldest first.
    fn get_history_for_key(&self, key: &str) -> LedgerResult<HistoryIter<'_>>;
}
