//! Single-entity access: ledger reads and writes through the entity codec.
//!
//! A fetch fails with `NotFound` when the key is absent, when its payload
//! cannot be decoded, or when it holds some other kind of record.

use crate::error::{ChaincodeError, ChaincodeResult};
use marbles_ledger::LedgerStub;
use marbles_types::{LedgerRecord, Marble, User};
use tracing::warn;

pub fn get_user(stub: &dyn LedgerStub, id: &str) -> ChaincodeResult<User> {
    fetch(stub, id, "user")
}

pub fn get_marble(stub: &dyn LedgerStub, id: &str) -> ChaincodeResult<Marble> {
    fetch(stub, id, "marble")
}

/// Whether anything at all is stored under `key`.
pub fn key_exists(stub: &dyn LedgerStub, key: &str) -> ChaincodeResult<bool> {
    Ok(stub.get_state(key)?.is_some())
}

/// Encode `record` and store it under its own id, returning the payload.
pub fn put_record<T: LedgerRecord>(
    stub: &mut dyn LedgerStub,
    record: &T,
) -> ChaincodeResult<Vec<u8>> {
    let bytes = record.encode()?;
    stub.put_state(record.record_id(), bytes.clone())?;
    Ok(bytes)
}

fn fetch<T: LedgerRecord>(stub: &dyn LedgerStub, id: &str, label: &str) -> ChaincodeResult<T> {
    let bytes = stub
        .get_state(id)?
        .ok_or_else(|| ChaincodeError::NotFound(format!("{label} {id} does not exist")))?;

    let record = T::decode(&bytes).map_err(|err| {
        warn!(key = id, error = %err, "stored {label} could not be decoded");
        ChaincodeError::NotFound(format!("{label} {id} could not be decoded"))
    })?;

    if !record.is_stored_under(id) {
        return Err(ChaincodeError::NotFound(format!(
            "{label} {id} does not exist (key holds a different record)"
        )));
    }
    Ok(record)
}
