mod common;

use common::Host;
use marbles_chaincode::{
    Chaincode, ChaincodeConfig, ChaincodeError, Everything, HistoryRecord, RangeRecord,
    ValidationError,
};
use marbles_types::{Marble, ReviewStatus, StageKind};

fn marbles(payload: &[u8]) -> Vec<Marble> {
    serde_json::from_slice(payload).unwrap()
}

fn ids(payload: &[u8]) -> Vec<String> {
    marbles(payload).into_iter().map(|m| m.id).collect()
}

#[test]
fn new_marble_opens_first_review() {
    let mut host = Host::new();
    host.ok("init_owner", &["o1", "alice", "Acme"]);
    let payload = host.ok("init_marble", &["m1", "555", "100", "t", "o1", "Acme"]);

    let marble = host.marble("m1");
    assert_eq!(payload, host.ledger.get("m1").unwrap().unwrap());
    assert_eq!(marble.contact, "555");
    assert_eq!(marble.balance, 100);
    assert_eq!(marble.owner.username, "alice");

    let new = marble.stage(StageKind::New);
    assert_eq!((new.actor_id.as_str(), new.status), ("o1", ReviewStatus::Success));
    assert_eq!(new.date, "2024-03-01 08:02:00");
    let apply = marble.stage(StageKind::SupplierApply);
    assert_eq!((apply.actor_id.as_str(), apply.status), ("o1", ReviewStatus::Waiting));
    for stage in &StageKind::ALL[2..] {
        assert_eq!(marble.stage(*stage).status, ReviewStatus::Disabled);
    }
}

#[test]
fn explicit_approval_defaults_next_actor_to_caller() {
    let mut host = Host::new();
    host.ok("init_owner", &["o1", "alice", "Acme"]);
    host.ok("init_marble", &["m1", "555", "100", "t", "o1", "Acme"]);
    host.ok("tx_marble", &["m1", "o1", "1", "2", "looks good"]);

    let marble = host.marble("m1");
    let apply = marble.stage(StageKind::SupplierApply);
    assert_eq!(apply.status, ReviewStatus::Success);
    assert_eq!(apply.comment, "looks good");
    assert_eq!(apply.company, "Acme");
    let check = marble.stage(StageKind::EnterpriseCheck);
    assert_eq!((check.actor_id.as_str(), check.status), ("o1", ReviewStatus::Waiting));
}

#[test]
fn explicit_approval_assigns_named_next_actor() {
    let mut host = Host::with_parties();
    host.ok("tx_marble", &["m1", "o1", "1", "2", "o2", "forwarded"]);

    let marble = host.marble("m1");
    assert_eq!(marble.stage(StageKind::EnterpriseCheck).actor_id, "o2");
    assert_eq!(marble.stage(StageKind::SupplierApply).comment, "forwarded");

    // o1 may no longer act on the stage it handed over.
    let err = host
        .call("tx_marble", &["m1", "o1", "2", "2", "again"])
        .unwrap_err();
    assert!(matches!(err, ChaincodeError::Authorization(_)));
}

#[test]
fn reviewing_a_settled_stage_changes_nothing() {
    let mut host = Host::with_parties();
    host.ok("tx_marble", &["m1", "o1", "1", "2", "ok"]);
    let before = host.snapshot();

    let err = host.call("tx_marble", &["m1", "o1", "1", "2", "twice"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::State(_)));

    let after = host.snapshot();
    assert_eq!(before.state, after.state);
    assert_eq!(before.history, after.history);
}

#[test]
fn explicit_review_bounds() {
    let mut host = Host::with_parties();
    for stage in ["0", "7", "8"] {
        let err = host.call("tx_marble", &["m1", "o1", stage, "2", "x"]).unwrap_err();
        assert!(matches!(err, ChaincodeError::State(_)), "stage {stage}: {err}");
    }
    let err = host.call("tx_marble", &["m1", "o1", "1", "1", "x"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::State(_)));
    let err = host.call("tx_marble", &["m1", "o1", "one", "2", "x"]).unwrap_err();
    assert!(matches!(
        err,
        ChaincodeError::Validation(ValidationError::NotNumeric { index: 2 })
    ));
    let err = host.call("tx_marble", &["m9", "o1", "1", "2", "x"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::NotFound(_)));
    let err = host.call("tx_marble", &["m1", "o9", "1", "2", "x"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::NotFound(_)));
}

#[test]
fn auto_review_runs_the_full_chain() {
    let mut host = Host::with_parties();
    let chain = [
        ("o1", StageKind::SupplierApply, "o2"),
        ("o2", StageKind::EnterpriseCheck, "o3"),
        ("o3", StageKind::BankCheck, "o1"),
        ("o1", StageKind::SupplierReceipt, "o2"),
        ("o2", StageKind::EnterpriseRepayment, "o1"),
    ];
    for (reviewer, stage, next) in chain {
        host.ok("review_marble", &["m1", reviewer, "2", "approved"]);
        let marble = host.marble("m1");
        assert_eq!(marble.stage(stage).status, ReviewStatus::Success);
        let following = marble.stage(stage.next().unwrap());
        assert_eq!(following.actor_id, next);
        assert_eq!(following.status, ReviewStatus::Waiting);
        assert_eq!(marble.stage(StageKind::End).status, ReviewStatus::Disabled);
    }

    // The bank may not settle the supplier's repayment.
    let err = host.call("review_marble", &["m1", "o3", "2", "repaid"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::Authorization(_)));

    let payload = host.ok("review_marble", &["m1", "o1", "2", "repaid"]);
    let marble = host.marble("m1");
    assert_eq!(serde_json::from_slice::<Marble>(&payload).unwrap(), marble);
    let repayment = marble.stage(StageKind::SupplierRepayment);
    assert_eq!(repayment.status, ReviewStatus::Success);
    assert_eq!(repayment.company, "supplier");
    let end = marble.stage(StageKind::End);
    assert_eq!(end.status, ReviewStatus::Success);
    assert_eq!(end.actor_id, "");
    assert_eq!(end.company, "supplier");
    assert_eq!(marble.waiting_stage(), None);

    let err = host.call("review_marble", &["m1", "o1", "2", "again"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::State(_)));
}

#[test]
fn auto_review_checks_company() {
    let mut host = Host::with_parties();
    let err = host.call("review_marble", &["m1", "o3", "2", "bank"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::Authorization(_)));
    assert_eq!(host.marble("m1").stage(StageKind::SupplierApply).status, ReviewStatus::Waiting);
}

#[test]
fn auto_review_needs_a_next_company_user() {
    let mut host = Host::new();
    host.ok("init_owner", &["o1", "alice", "supplier"]);
    host.ok("init_marble", &["m1", "555", "100", "t", "o1", "supplier"]);

    let err = host.call("review_marble", &["m1", "o1", "2", "ok"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::NotFound(_)));

    // Rejection needs no successor.
    host.ok("review_marble", &["m1", "o1", "3", "cancelled"]);
    assert_eq!(host.marble("m1").stage(StageKind::End).status, ReviewStatus::Failure);
}

#[test]
fn rejection_ends_the_workflow() {
    let mut host = Host::with_parties();
    host.ok("review_marble", &["m1", "o1", "2", "apply"]);
    host.ok("review_marble", &["m1", "o2", "3", "credit too low"]);

    let marble = host.marble("m1");
    assert_eq!(marble.stage(StageKind::EnterpriseCheck).status, ReviewStatus::Failure);
    assert_eq!(marble.stage(StageKind::BankCheck).status, ReviewStatus::Disabled);
    let end = marble.stage(StageKind::End);
    assert_eq!(end.status, ReviewStatus::Failure);
    assert_eq!(end.actor_id, "o2");
    assert!(end.comment.contains("credit too low"));

    for reviewer in ["o1", "o2", "o3"] {
        assert!(host.call("review_marble", &["m1", reviewer, "2", "x"]).is_err());
    }
}

#[test]
fn disabled_users_lose_rights_and_visibility() {
    let mut host = Host::with_parties();
    host.ok("disable_owner", &["o1", "supplier"]);
    host.ok("disable_owner", &["o1", "supplier"]);

    let err = host.call("tx_marble", &["m1", "o1", "1", "2", "x"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::Authorization(_)));
    let err = host
        .call("init_marble", &["m2", "556", "5", "t", "o1", "supplier"])
        .unwrap_err();
    assert!(matches!(err, ChaincodeError::Authorization(_)));
    let err = host.call("read_allmarble", &["o1"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::Authorization(_)));

    let everything: Everything =
        serde_json::from_slice(&host.ok("read_everything", &[])).unwrap();
    let owners: Vec<_> = everything.owners.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(owners, ["o2", "o3"]);
    assert_eq!(everything.marbles.len(), 1);

    let err = host.call("init_owner", &["o1", "alice", "supplier"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::AlreadyExists(_)));
}

#[test]
fn delete_is_company_gated() {
    let mut host = Host::with_parties();
    let before = host.snapshot();
    let err = host.call("delete_marble", &["m1", "WrongCo"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::Authorization(_)));
    assert_eq!(before.state, host.snapshot().state);

    host.ok("delete_marble", &["m1", "supplier"]);
    assert_eq!(host.ledger.get("m1").unwrap(), None);
    let err = host.call("delete_marble", &["m1", "supplier"]).unwrap_err();
    assert!(matches!(err, ChaincodeError::NotFound(_)));
}

#[test]
fn reviewers_see_marbles_they_act_on() {
    let mut host = Host::with_parties();
    host.ok("init_marble", &["m2", "556", "7", "other", "o1", "supplier"]);
    host.ok("tx_marble", &["m1", "o1", "1", "2", "o2", "to bob"]);

    assert_eq!(ids(&host.ok("read_allmarble", &["o2"])), ["m1"]);
    assert_eq!(ids(&host.ok("read_allmarble", &["o1"])), ["m1", "m2"]);
    assert!(ids(&host.ok("read_allmarble", &["o3"])).is_empty());

    let waiting = host.ok("read_allstate", &["o2", "2", "1"]);
    assert_eq!(ids(&waiting), ["m1"]);
    let applying = host.ok("read_allmarble", &["o1", "1", "1"]);
    assert_eq!(ids(&applying), ["m2"]);

    let everything: Everything =
        serde_json::from_slice(&host.ok("read_everything", &["core-enterprise"])).unwrap();
    assert_eq!(everything.owners.len(), 3);
    assert_eq!(everything.marbles.len(), 1);
    assert_eq!(everything.marbles[0].id, "m1");
}

#[test]
fn reviewer_depth_is_configurable() {
    let hand_to_bank = |host: &mut Host| {
        for stage in ["1", "2", "3", "4"] {
            host.ok("tx_marble", &["m1", "o1", stage, "2", "ok"]);
        }
        host.ok("tx_marble", &["m1", "o1", "5", "2", "o3", "to carol"]);
        ids(&host.ok("read_allmarble", &["o3"]))
    };

    let mut shallow = Host::with_parties();
    assert!(hand_to_bank(&mut shallow).is_empty());

    let config = ChaincodeConfig {
        reviewer_stage_depth: 8,
        ..ChaincodeConfig::default()
    };
    let mut deep = Host::with_chaincode(Chaincode::new(config).unwrap());
    deep.ok("init_owner", &["o1", "alice", "supplier"]);
    deep.ok("init_owner", &["o3", "carol", "bank"]);
    deep.ok("init_marble", &["m1", "555", "100", "t", "o1", "supplier"]);
    assert_eq!(hand_to_bank(&mut deep), ["m1"]);
}

#[test]
fn empty_directory_reads_as_empty_list() {
    let mut host = Host::new();
    host.ok("init_owner", &["o1", "alice", "supplier"]);
    assert_eq!(host.ok("read_allmarble", &["o1"]), b"[]");
    let everything: Everything = serde_json::from_slice(&host.ok("read_everything", &[])).unwrap();
    assert!(everything.marbles.is_empty());
}

#[test]
fn history_follows_every_version() {
    let mut host = Host::with_parties();
    host.ok("review_marble", &["m1", "o1", "2", "apply"]);
    host.ok("delete_marble", &["m1", "supplier"]);

    let history: Vec<HistoryRecord> =
        serde_json::from_slice(&host.ok("getHistory", &["m1"])).unwrap();
    let tx_ids: Vec<_> = history.iter().map(|h| h.tx_id.as_str()).collect();
    assert_eq!(tx_ids, ["tx-4", "tx-5", "tx-6"]);
    assert_eq!(history[0].value.stage(StageKind::SupplierApply).status, ReviewStatus::Waiting);
    assert_eq!(history[1].value.stage(StageKind::SupplierApply).status, ReviewStatus::Success);
    assert_eq!(history[2].value, Marble::default());

    let raw: serde_json::Value = serde_json::from_slice(&host.ok("getHistory", &["m1"])).unwrap();
    assert_eq!(raw[0]["txId"], "tx-4");
    assert_eq!(raw[0]["value"]["docType"], "marble");
}

#[test]
fn range_query_returns_raw_records() {
    let mut host = Host::with_parties();
    host.ok("write", &["m2", "plain"]);
    let records: Vec<RangeRecord> =
        serde_json::from_slice(&host.ok("getMarblesByRange", &["m1", "m3"])).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].key, "m1");
    assert_eq!(records[0].record["user"]["id"], "o1");
    assert_eq!(records[1].record, serde_json::json!("plain"));

    // The raw entry is not a marble and is skipped by directory scans.
    assert_eq!(ids(&host.ok("read_allmarble", &["o1"])), ["m1"]);
}

#[test]
fn raw_keys_and_init() {
    let mut host = Host::new();
    host.ok("init", &["7"]);
    assert_eq!(host.ok("read", &["selftest"]), b"7");
    assert_eq!(host.ok("read", &["marbles_ui"]), b"4.0.1");

    host.ok("write", &["greeting", "hello"]);
    assert_eq!(host.ok("read", &["greeting"]), b"hello");
    assert!(matches!(
        host.call("read", &["missing"]),
        Err(ChaincodeError::NotFound(_))
    ));
    assert!(matches!(
        host.call("write", &["greeting", ""]),
        Err(ChaincodeError::Validation(ValidationError::Empty { index: 1 }))
    ));
}

#[test]
fn replay_is_deterministic() {
    let run = || {
        let mut host = Host::with_parties();
        host.ok("review_marble", &["m1", "o1", "2", "apply"]);
        host.ok("tx_marble", &["m1", "o2", "2", "3", "declined"]);
        host.snapshot()
    };
    assert_eq!(run(), run());
}
