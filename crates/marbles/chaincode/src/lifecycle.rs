//! Create, disable and delete operations plus the raw key passthroughs.

use crate::approval::{ApprovalMachine, DATE_FORMAT};
use crate::config::ChaincodeConfig;
use crate::error::{ChaincodeError, ChaincodeResult, ValidationError};
use crate::store;
use marbles_ledger::LedgerStub;
use marbles_types::{Marble, User};
use tracing::info;

/// Key written by `init` with its numeric self-test argument.
pub const SELFTEST_KEY: &str = "selftest";
/// Key written by `init` with the client application version.
pub const UI_VERSION_KEY: &str = "marbles_ui";

/// Arguments of `init_marble`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMarble {
    pub id: String,
    pub contact: String,
    pub balance: i64,
    pub title: String,
    pub owner_id: String,
    pub authorizing_company: String,
}

/// Instantiate/upgrade hook. A single non-empty argument must be numeric and
/// is stored under [`SELFTEST_KEY`]; any other argument shape is ignored.
pub fn init(
    stub: &mut dyn LedgerStub,
    config: &ChaincodeConfig,
    args: &[String],
) -> ChaincodeResult<()> {
    if let [value] = args {
        if !value.is_empty() {
            let number: i64 = value
                .parse()
                .map_err(|_| ValidationError::NotNumeric { index: 0 })?;
            stub.put_state(SELFTEST_KEY, number.to_string().into_bytes())?;
        }
    }
    stub.put_state(UI_VERSION_KEY, config.ui_version.clone().into_bytes())?;
    info!(tx_id = stub.tx_id(), ui_version = %config.ui_version, "chaincode initialized");
    Ok(())
}

pub fn create_user(
    stub: &mut dyn LedgerStub,
    id: &str,
    username: &str,
    company: &str,
) -> ChaincodeResult<User> {
    if store::key_exists(stub, id)? {
        return Err(ChaincodeError::AlreadyExists(format!(
            "this owner already exists - {id}"
        )));
    }
    let user = User::new(id, username, company);
    store::put_record(stub, &user)?;
    info!(user_id = %user.id, company = %user.company, "user created");
    Ok(user)
}

/// Flip `enabled` to false. Disabling an already-disabled user succeeds.
pub fn disable_user(
    stub: &mut dyn LedgerStub,
    id: &str,
    authorizing_company: &str,
) -> ChaincodeResult<User> {
    let mut user = store::get_user(stub, id)?;
    if user.company != authorizing_company {
        return Err(ChaincodeError::Authorization(format!(
            "the company '{authorizing_company}' cannot authorize disabling user {id}"
        )));
    }
    user.enabled = false;
    store::put_record(stub, &user)?;
    info!(user_id = %user.id, "user disabled");
    Ok(user)
}

/// Create a marble with `New` completed and `SupplierApply` waiting on the
/// owner. Returns the stored marble and its encoded payload.
pub fn create_marble(
    stub: &mut dyn LedgerStub,
    machine: &ApprovalMachine,
    request: &NewMarble,
) -> ChaincodeResult<(Marble, Vec<u8>)> {
    let owner = store::get_user(stub, &request.owner_id)?;
    if !owner.enabled {
        return Err(ChaincodeError::Authorization(format!(
            "owner {} is disabled",
            owner.id
        )));
    }
    if owner.company != request.authorizing_company {
        return Err(ChaincodeError::Authorization(format!(
            "the company '{}' cannot authorize creation for '{}'",
            request.authorizing_company, owner.company
        )));
    }
    if store::key_exists(stub, &request.id)? {
        return Err(ChaincodeError::AlreadyExists(format!(
            "this marble already exists - {}",
            request.id
        )));
    }

    let mut marble = Marble::new(
        request.id.as_str(),
        request.contact.as_str(),
        request.balance,
        request.title.as_str(),
        &owner,
    );
    let date = stub.tx_timestamp().format(DATE_FORMAT).to_string();
    machine.open(&mut marble, &owner, &date);
    let bytes = store::put_record(stub, &marble)?;
    info!(
        marble_id = %marble.id,
        owner = %owner.id,
        balance = marble.balance,
        "marble created"
    );
    Ok((marble, bytes))
}

/// Hard delete, allowed at any stage for the owner's company.
pub fn delete_marble(
    stub: &mut dyn LedgerStub,
    id: &str,
    authorizing_company: &str,
) -> ChaincodeResult<()> {
    let marble = store::get_marble(stub, id)?;
    if marble.owner.company != authorizing_company {
        return Err(ChaincodeError::Authorization(format!(
            "the company '{authorizing_company}' cannot authorize deletion for '{}'",
            marble.owner.company
        )));
    }
    stub.del_state(id)?;
    info!(marble_id = id, "marble deleted");
    Ok(())
}

/// Raw value stored under `key`.
pub fn generic_read(stub: &dyn LedgerStub, key: &str) -> ChaincodeResult<Vec<u8>> {
    stub.get_state(key)?
        .ok_or_else(|| ChaincodeError::NotFound(format!("key {key} does not exist")))
}

pub fn generic_write(stub: &mut dyn LedgerStub, key: &str, value: &str) -> ChaincodeResult<()> {
    stub.put_state(key, value.as_bytes().to_vec())?;
    info!(key, "raw value written");
    Ok(())
}
