//! In-memory reference ledger.
//!
//! Deterministic and test-friendly: world state lives in a sorted map, every
//! committed write or delete is appended to the key's history, and writes are
//! only visible once the owning [`Transaction`] commits.
//!
//! Concurrent transactions are validated optimistically. A key's version is
//! the length of its history; every point read and range scan records the
//! versions it observed, and `commit` fails with [`LedgerError::Conflict`]
//! when any of them moved in the meantime.

use crate::stub::{HistoryIter, KeyModification, KeyValue, LedgerStub, StateIter};
use crate::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;
use std::sync::RwLock;
use tracing::debug;

/// Serializable image of a ledger: world state plus key history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Number of committed transactions.
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub state: BTreeMap<String, Vec<u8>>,
    #[serde(default)]
    pub history: BTreeMap<String, Vec<KeyModification>>,
}

/// Summary of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub tx_id: String,
    pub height: u64,
    pub writes: usize,
}

/// In-memory ledger adapter.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    inner: RwLock<LedgerSnapshot>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
        }
    }

    /// Load a ledger previously written by [`InMemoryLedger::save`].
    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| LedgerError::Io(format!("read {}: {e}", path.display())))?;
        let snapshot: LedgerSnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        debug!(path = %path.display(), height = snapshot.height, "ledger snapshot loaded");
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> LedgerResult<()> {
        let path = path.as_ref();
        let snapshot = self.snapshot()?;
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)
            .map_err(|e| LedgerError::Io(format!("write {}: {e}", path.display())))?;
        debug!(path = %path.display(), height = snapshot.height, "ledger snapshot saved");
        Ok(())
    }

    pub fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        Ok(self.read_guard()?.clone())
    }

    /// Committed value of `key`, outside of any transaction.
    pub fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.read_guard()?.state.get(key).cloned())
    }

    pub fn height(&self) -> LedgerResult<u64> {
        Ok(self.read_guard()?.height)
    }

    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.read_guard()?.state.len())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Open a transaction. Its writes are discarded unless committed.
    pub fn begin(&self, tx_id: impl Into<String>, timestamp: DateTime<Utc>) -> Transaction<'_> {
        Transaction {
            ledger: self,
            tx_id: tx_id.into(),
            timestamp,
            writes: BTreeMap::new(),
            reads: RefCell::new(BTreeMap::new()),
            scans: RefCell::new(Vec::new()),
        }
    }

    fn read_guard(&self) -> LedgerResult<std::sync::RwLockReadGuard<'_, LedgerSnapshot>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Poisoned("world state".to_string()))
    }

    fn apply(
        &self,
        tx_id: &str,
        timestamp: DateTime<Utc>,
        writes: BTreeMap<String, Option<Vec<u8>>>,
        reads: &BTreeMap<String, u64>,
        scans: &[RangeRead],
    ) -> LedgerResult<CommitReceipt> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| LedgerError::Poisoned("world state".to_string()))?;

        for (key, seen) in reads {
            let current = guard.version(key);
            if current != *seen {
                return Err(LedgerError::Conflict(format!(
                    "{tx_id}: key {key} moved from version {seen} to {current}"
                )));
            }
        }
        for scan in scans {
            if guard.range_versions(&scan.start, &scan.end) != scan.versions {
                return Err(LedgerError::Conflict(format!(
                    "{tx_id}: range [{}, {}) changed",
                    scan.start, scan.end
                )));
            }
        }

        let count = writes.len();
        for (key, value) in writes {
            match &value {
                Some(bytes) => {
                    guard.state.insert(key.clone(), bytes.clone());
                }
                None => {
                    guard.state.remove(&key);
                }
            }
            guard.history.entry(key).or_default().push(KeyModification {
                tx_id: tx_id.to_string(),
                timestamp,
                is_delete: value.is_none(),
                value,
            });
        }
        guard.height += 1;

        Ok(CommitReceipt {
            tx_id: tx_id.to_string(),
            height: guard.height,
            writes: count,
        })
    }
}

impl LedgerSnapshot {
    /// Number of committed modifications of `key`; `0` for a key never written.
    fn version(&self, key: &str) -> u64 {
        self.history.get(key).map_or(0, |entries| entries.len() as u64)
    }

    fn range(&self, start: &str, end: &str) -> Vec<(&String, &Vec<u8>)> {
        if !start.is_empty() && !end.is_empty() && start >= end {
            return Vec::new();
        }
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };
        self.state.range::<str, _>((lower, upper)).collect()
    }

    fn range_versions(&self, start: &str, end: &str) -> Vec<(String, u64)> {
        self.range(start, end)
            .into_iter()
            .map(|(key, _)| (key.clone(), self.version(key)))
            .collect()
    }
}

/// Keys and versions returned by one range scan.
#[derive(Debug)]
struct RangeRead {
    start: String,
    end: String,
    versions: Vec<(String, u64)>,
}

/// A single transaction against an [`InMemoryLedger`].
///
/// Reads observe committed state only; writes are buffered per key, the last
/// write to a key winning.
pub struct Transaction<'a> {
    ledger: &'a InMemoryLedger,
    tx_id: String,
    timestamp: DateTime<Utc>,
    writes: BTreeMap<String, Option<Vec<u8>>>,
    reads: RefCell<BTreeMap<String, u64>>,
    scans: RefCell<Vec<RangeRead>>,
}

impl Transaction<'_> {
    /// Keys written or deleted so far.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Apply all buffered writes atomically, provided nothing this
    /// transaction read was committed over since.
    pub fn commit(self) -> LedgerResult<CommitReceipt> {
        let reads = self.reads.into_inner();
        let scans = self.scans.into_inner();
        let receipt = self
            .ledger
            .apply(&self.tx_id, self.timestamp, self.writes, &reads, &scans)?;
        debug!(
            tx_id = %receipt.tx_id,
            height = receipt.height,
            writes = receipt.writes,
            "transaction committed"
        );
        Ok(receipt)
    }
}

fn check_key(key: &str) -> LedgerResult<()> {
    if key.is_empty() {
        return Err(LedgerError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}

impl LedgerStub for Transaction<'_> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        check_key(key)?;
        let guard = self.ledger.read_guard()?;
        self.reads
            .borrow_mut()
            .entry(key.to_string())
            .or_insert_with(|| guard.version(key));
        Ok(guard.state.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        check_key(key)?;
        self.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn del_state(&mut self, key: &str) -> LedgerResult<()> {
        check_key(key)?;
        self.writes.insert(key.to_string(), None);
        Ok(())
    }

    fn get_state_by_range(&self, start: &str, end: &str) -> LedgerResult<StateIter<'_>> {
        let guard = self.ledger.read_guard()?;
        let entries = guard
            .range(start, end)
            .into_iter()
            .map(|(key, value)| {
                Ok(KeyValue {
                    key: key.clone(),
                    value: value.clone(),
                })
            })
            .collect::<Vec<_>>();
        self.scans.borrow_mut().push(RangeRead {
            start: start.to_string(),
            end: end.to_string(),
            versions: guard.range_versions(start, end),
        });
        Ok(Box::new(entries.into_iter()))
    }

    fn get_history_for_key(&self, key: &str) -> LedgerResult<HistoryIter<'_>> {
        check_key(key)?;
        let guard = self.ledger.read_guard()?;
        let entries = guard
            .history
            .get(key)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(Ok)
            .collect::<Vec<_>>();
        Ok(Box::new(entries.into_iter()))
    }
}
