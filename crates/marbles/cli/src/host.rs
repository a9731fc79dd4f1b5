//! Local peer: runs one invocation against a snapshot file.

use anyhow::Context;
use chrono::{DateTime, Utc};
use marbles_chaincode::{Chaincode, ChaincodeConfig};
use marbles_ledger::InMemoryLedger;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One invocation as received from the command line.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub function: String,
    pub args: Vec<String>,
}

/// Read a TOML chaincode configuration; defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ChaincodeConfig> {
    let Some(path) = path else {
        return Ok(ChaincodeConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: ChaincodeConfig =
        toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))?;
    debug!(path = %path.display(), "chaincode config loaded");
    Ok(config)
}

pub struct Peer {
    chaincode: Chaincode,
    ledger_path: PathBuf,
}

impl Peer {
    pub fn new(config: ChaincodeConfig, ledger_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Ok(Self {
            chaincode: Chaincode::new(config)?,
            ledger_path: ledger_path.into(),
        })
    }

    fn open_ledger(&self) -> anyhow::Result<InMemoryLedger> {
        if self.ledger_path.exists() {
            Ok(InMemoryLedger::load(&self.ledger_path)?)
        } else {
            info!(path = %self.ledger_path.display(), "starting a new ledger");
            Ok(InMemoryLedger::new())
        }
    }

    /// Execute `invocation`. The snapshot file is rewritten only when the
    /// chaincode succeeds.
    pub fn execute(&self, invocation: &Invocation) -> anyhow::Result<Vec<u8>> {
        let ledger = self.open_ledger()?;
        let mut tx = ledger.begin(invocation.tx_id.as_str(), invocation.timestamp);
        let payload = self
            .chaincode
            .invoke(&mut tx, &invocation.function, &invocation.args)
            .with_context(|| format!("{} failed", invocation.function))?;

        if tx.pending_writes() == 0 {
            return Ok(payload);
        }
        let receipt = tx.commit()?;
        if let Some(parent) = self.ledger_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        ledger.save(&self.ledger_path)?;
        info!(
            tx_id = %receipt.tx_id,
            height = receipt.height,
            writes = receipt.writes,
            "transaction committed"
        );
        Ok(payload)
    }
}
