//! Marbles record types.
//!
//! A *marble* is a supply-chain-finance application that travels through a
//! fixed eight-stage review among a supplier, a core enterprise and a bank.
//! A *user* is a participant identity bound to one of those companies.
//!
//! The persisted field names of every record here are part of the ledger
//! format and must never change; see [`codec`].

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod codec;
mod marble;
mod stage;
mod user;

pub use codec::{CodecError, CodecResult, LedgerRecord};
pub use marble::{CheckInfo, Marble, UserRelation, MARBLE_DOC_TYPE};
pub use stage::{ReviewStatus, StageKind, STAGE_COUNT};
pub use user::{User, USER_DOC_TYPE};
