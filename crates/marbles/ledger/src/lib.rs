//! Marbles ledger access shim.
//!
//! The ledger itself (durability, replication, ordering) is external. This
//! crate defines the narrow contract the chaincode uses against it:
//! - point reads that distinguish "absent" from "failed"
//! - buffered writes and deletes scoped to one transaction
//! - ascending range scans and per-key modification history
//!
//! [`InMemoryLedger`] is the deterministic reference implementation used by
//! tests and by the local host.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod stub;

pub use error::{LedgerError, LedgerResult};
pub use memory::{CommitReceipt, InMemoryLedger, LedgerSnapshot, Transaction};
pub use stub::{HistoryIter, KeyModification, KeyValue, LedgerStub, StateIter};
