//! Binary smoke tests: replay fixtures through the `floorledger` CLI.

mod support;

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

use floorledger::domain::{EventEnvelope, ResolutionType};

use support::{units, EventLog, ALICE, BETA_2_0, DECIMALS, USDC};

fn write_event_log(dir: &Path, envelopes: &[EventEnvelope]) -> PathBuf {
    let path = dir.join("events.ndjson");
    let lines: Vec<String> = envelopes
        .iter()
        .map(|envelope| serde_json::to_string(envelope).expect("serializable envelope"))
        .collect();
    fs::write(&path, lines.join("\n")).expect("write event log");
    path
}

fn write_token_table(dir: &Path) -> PathBuf {
    let path = dir.join("tokens.json");
    let table = serde_json::json!({
        USDC: {"name": "USD Coin", "symbol": "USDC", "decimals": DECIMALS},
    });
    fs::write(&path, table.to_string()).expect("write token table");
    path
}

fn resolved_floor_log() -> Vec<EventEnvelope> {
    let mut log = EventLog::new();
    vec![
        log.whitelist(USDC),
        log.create_floor("0x1", ALICE, 2, units(50)),
        log.commit("0x1", 0, ALICE, "0xaaa1", units(10), BETA_2_0),
        log.resolve("0x1", 0, ResolutionType::Winners, units(5)),
    ]
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("floorledger")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("claim"));
}

#[test]
fn ingest_reports_aggregate_totals() {
    let dir = tempfile::tempdir().unwrap();
    let events = write_event_log(dir.path(), &resolved_floor_log());
    let tokens = write_token_table(dir.path());

    Command::cargo_bin("floorledger")
        .unwrap()
        .args(["ingest", "--events"])
        .arg(&events)
        .arg("--tokens")
        .arg(&tokens)
        .assert()
        .success()
        .stdout(predicate::str::contains("events applied: 4"))
        .stdout(predicate::str::contains("virtual floors: 1"))
        .stdout(predicate::str::contains("payment tokens: 1"));
}

#[test]
fn claim_emits_prepared_claim_json() {
    let dir = tempfile::tempdir().unwrap();
    let events = write_event_log(dir.path(), &resolved_floor_log());
    let tokens = write_token_table(dir.path());

    Command::cargo_bin("floorledger")
        .unwrap()
        .args(["claim", "--events"])
        .arg(&events)
        .arg("--tokens")
        .arg(&tokens)
        .args(["--virtual-floor", "0x1", "--user", ALICE])
        .assert()
        .success()
        .stdout(predicate::str::contains("Payouts"))
        .stdout(predicate::str::contains("15"));
}

#[test]
fn out_of_order_log_halts_with_position() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = EventLog::new();
    let first = log.whitelist(USDC);
    let events = write_event_log(dir.path(), &[first.clone(), first]);
    let tokens = write_token_table(dir.path());

    Command::cargo_bin("floorledger")
        .unwrap()
        .args(["ingest", "--events"])
        .arg(&events)
        .arg("--tokens")
        .arg(&tokens)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ingestion halted"));
}
