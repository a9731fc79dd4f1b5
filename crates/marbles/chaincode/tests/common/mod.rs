#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use marbles_chaincode::{Chaincode, ChaincodeResult};
use marbles_ledger::{InMemoryLedger, LedgerSnapshot};
use marbles_types::{LedgerRecord, Marble};

/// Runs invocations the way a peer would: one transaction per call,
/// committed only when the chaincode succeeds.
pub struct Host {
    pub chaincode: Chaincode,
    pub ledger: InMemoryLedger,
    calls: u32,
}

impl Host {
    pub fn new() -> Self {
        Self::with_chaincode(Chaincode::default())
    }

    pub fn with_chaincode(chaincode: Chaincode) -> Self {
        Self {
            chaincode,
            ledger: InMemoryLedger::new(),
            calls: 0,
        }
    }

    /// Deterministic timestamp of the `n`th call.
    pub fn clock(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(i64::from(n))
    }

    pub fn call(&mut self, function: &str, args: &[&str]) -> ChaincodeResult<Vec<u8>> {
        self.calls += 1;
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let mut tx = self
            .ledger
            .begin(format!("tx-{}", self.calls), Self::clock(self.calls));
        let payload = self.chaincode.invoke(&mut tx, function, &args)?;
        tx.commit().unwrap();
        Ok(payload)
    }

    pub fn ok(&mut self, function: &str, args: &[&str]) -> Vec<u8> {
        match self.call(function, args) {
            Ok(payload) => payload,
            Err(err) => panic!("{function} {args:?} failed: {err}"),
        }
    }

    pub fn marble(&self, id: &str) -> Marble {
        let bytes = self.ledger.get(id).unwrap().expect("marble stored");
        Marble::decode(&bytes).unwrap()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot().unwrap()
    }

    /// Supplier `o1`, core enterprise `o2` and bank `o3`, plus marble `m1`
    /// opened by the supplier.
    pub fn with_parties() -> Self {
        let mut host = Self::new();
        host.ok("init_owner", &["o1", "alice", "supplier"]);
        host.ok("init_owner", &["o2", "bob", "core-enterprise"]);
        host.ok("init_owner", &["o3", "carol", "bank"]);
        host.ok("init_marble", &["m1", "555", "100", "invoice", "o1", "supplier"]);
        host
    }
}
