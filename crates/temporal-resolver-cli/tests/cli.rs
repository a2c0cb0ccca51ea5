//! Integration tests for the temporal-resolver binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};

const REFERENCE: &str = "2024-03-20T09:10:00";

fn resolver() -> Command {
    Command::cargo_bin("temporal-resolver").unwrap()
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

// ── payload ─────────────────────────────────────────────────────────────

#[test]
fn test_payload_single_from_stdin() {
    let output = resolver()
        .args(["payload", "--reference", REFERENCE])
        .write_stdin(r#"{"time_single": {"absolute": {"month": 7, "day": 30}}}"#)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        stdout_json(&output),
        json!({"parsable": true, "time_single": {"datetime": "2024-07-30T09:10:00"}})
    );
}

#[test]
fn test_payload_empty_is_unparsable_not_failure() {
    let output = resolver()
        .args(["payload", "--reference", REFERENCE])
        .write_stdin("{}")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value = stdout_json(&output);
    assert_eq!(value["parsable"], false);
    assert_eq!(
        value["reason"],
        "No datetime information provided in the input"
    );
}

#[test]
fn test_payload_with_single_and_range_fails() {
    resolver()
        .args(["payload", "--reference", REFERENCE])
        .write_stdin(
            r#"{"time_single": {"now": true}, "time_range": {"start_date": {"now": true}}}"#,
        )
        .assert()
        .failure()
        .stderr(predicate::str::contains("only one of"));
}

#[test]
fn test_invalid_reference_fails() {
    resolver()
        .args(["payload", "--reference", "yesterday"])
        .write_stdin(r#"{"time_single": {"now": true}}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid reference instant"));
}

#[test]
fn test_malformed_json_fails_with_context() {
    resolver()
        .args(["payload", "--reference", REFERENCE])
        .write_stdin("{not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid payload JSON"));
}

#[test]
fn test_week_start_sunday_changes_this_weekday() {
    // 2024-03-20 is a Wednesday
    let input = r#"{"time_single": {"weekday": {"weekday": "sunday", "offset": 0}}}"#;

    let monday = resolver()
        .args(["payload", "--reference", REFERENCE])
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        stdout_json(&monday)["time_single"]["datetime"],
        "2024-03-24T09:10:00"
    );

    let sunday = resolver()
        .args(["payload", "--reference", REFERENCE, "--week-start", "sunday"])
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        stdout_json(&sunday)["time_single"]["datetime"],
        "2024-03-17T09:10:00"
    );
}

// ── tool ────────────────────────────────────────────────────────────────

#[test]
fn test_tool_one_month_ago_at_3pm() {
    let output = resolver()
        .args(["tool", "--reference", REFERENCE])
        .write_stdin(
            r#"{"start": {"mode": "relative", "month": -1,
                "extended_time": {"mode": "absolute", "hour": 15}}}"#,
        )
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        stdout_json(&output)["time_single"]["datetime"],
        "2024-02-20T15:00:00"
    );
}

#[test]
fn test_tool_nesting_past_max_depth_fails() {
    let input = r#"{"start": {"mode": "absolute", "hour": 1,
        "extended_time": {"mode": "absolute", "minute": 2,
            "extended_time": {"mode": "absolute", "second": 3}}}}"#;
    resolver()
        .args(["tool", "--reference", REFERENCE, "--max-depth", "1"])
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nesting too deep"));
}

#[test]
fn test_tool_unparsable_relays_reasoning() {
    resolver()
        .args(["tool", "--reference", REFERENCE])
        .write_stdin(r#"{"parsable": false, "reasoning": "no time mentioned"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""reason":"no time mentioned""#));
}

// ── fragments ───────────────────────────────────────────────────────────

#[test]
fn test_fragments_range_from_input_file() {
    let output = resolver()
        .args(["fragments", "--reference", "2024-01-01T10:00:00"])
        .args(["--input", &fixture("early_morning_range.json")])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        stdout_json(&output),
        json!({
            "parsable": true,
            "time_range": {
                "start_date": {"datetime": "2024-07-30T02:00:00"},
                "end_date": {"datetime": "2024-07-30T05:00:00"}
            }
        })
    );
}

#[test]
fn test_missing_input_file_fails() {
    resolver()
        .args(["fragments", "--reference", REFERENCE])
        .args(["--input", &fixture("does_not_exist.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_fragments_pretty_output() {
    resolver()
        .args(["fragments", "--reference", REFERENCE, "--pretty"])
        .write_stdin(r#"{"elements": [{"mode": "now", "offset_unit": "day"}]}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"parsable\": true"));
}

// ── reference clock ─────────────────────────────────────────────────────

#[test]
fn test_timezone_without_reference() {
    let output = resolver()
        .args(["payload", "--timezone", "Asia/Tokyo"])
        .write_stdin(r#"{"time_single": {"now": true}}"#)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        stdout_json(&output),
        json!({"parsable": true, "time_single": {"now": true}})
    );
}

#[test]
fn test_invalid_timezone_fails() {
    resolver()
        .args(["payload", "--timezone", "Mars/Olympus_Mons"])
        .write_stdin(r#"{"time_single": {"now": true}}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid timezone"));
}
