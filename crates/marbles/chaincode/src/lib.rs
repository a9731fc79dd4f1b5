//! Marbles chaincode.
//!
//! Supply-chain-finance applications ("marbles") move through a fixed review
//! sequence shared by a supplier, a core enterprise and a bank. This crate
//! holds the business rules:
//!
//! - [`approval`]: stage sequencing, per-stage actor authorization and the
//!   success/failure transitions.
//! - [`directory`]: scan-and-filter queries over the ledger key space.
//! - [`lifecycle`]: user and marble creation, user disabling, marble deletion
//!   and the raw key passthroughs.
//! - [`Chaincode`]: dispatch of an invocation name and string arguments.
//!
//! Every operation runs against a [`marbles_ledger::LedgerStub`] and is a pure
//! function of the ledger state and transaction context it is given, so any
//! peer re-executing it reaches the same write set.
//!
//! ```no_run
//! use chrono::Utc;
//! use marbles_chaincode::Chaincode;
//! use marbles_ledger::InMemoryLedger;
//!
//! let chaincode = Chaincode::default();
//! let ledger = InMemoryLedger::new();
//! let mut tx = ledger.begin("tx-1", Utc::now());
//! let args = ["o1", "alice", "supplier"].map(String::from);
//! chaincode.invoke(&mut tx, "init_owner", &args).unwrap();
//! tx.commit().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod approval;
mod config;
pub mod directory;
mod error;
pub mod lifecycle;
mod router;
mod store;
mod validation;

pub use approval::{
    ApprovalMachine, ReviewDecision, ReviewOutcome, ReviewRequest, StageSelector, DATE_FORMAT,
};
pub use config::{ActorTable, ChaincodeConfig, KeyRange};
pub use directory::{Directory, Everything, HistoryRecord, RangeRecord};
pub use error::{ChaincodeError, ChaincodeResult, ValidationError};
pub use lifecycle::NewMarble;
pub use router::{Chaincode, FUNCTIONS};
