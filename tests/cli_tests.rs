//! Integration tests for the weave CLI
//!
//! These tests run the actual binary and verify output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn weave_cmd() -> Command {
    Command::cargo_bin("weave").unwrap()
}

#[test]
fn help_flag_describes_the_tool() {
    weave_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fills slot markers"));
}

#[test]
fn compose_help_lists_policies() {
    weave_cmd()
        .args(["compose", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--on-missing-slot"))
        .stdout(predicate::str::contains("--max-depth"))
        .stdout(predicate::str::contains("--parallel"));
}

#[test]
fn compose_fills_slots_from_json() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("doc.md");
    let slots = dir.path().join("slots.json");
    fs::write(&doc, "# Doc\n<!-- outlet: intro -->\n").unwrap();
    fs::write(&slots, r#"{"intro": "Hello from a slot."}"#).unwrap();

    weave_cmd()
        .args([
            "compose",
            doc.to_str().unwrap(),
            "--slots",
            slots.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Doc\nHello from a slot.\n"));
}

#[test]
fn compose_pulls_content_from_source_slots() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("doc.md");
    let frag = dir.path().join("frag.md");
    let slots = dir.path().join("slots.json");
    fs::write(&doc, "[<!-- slot: body -->]").unwrap();
    fs::write(&frag, "fragment text").unwrap();
    fs::write(&slots, r#"{"body": {"source": "frag.md"}}"#).unwrap();

    weave_cmd()
        .args([
            "compose",
            doc.to_str().unwrap(),
            "--slots",
            slots.to_str().unwrap(),
            "--base-path",
            dir.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[fragment text]"));
}

#[test]
fn compose_writes_to_out_file() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("doc.md");
    let out = dir.path().join("out.md");
    fs::write(&doc, "no markers here").unwrap();

    weave_cmd()
        .args([
            "compose",
            doc.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&out).unwrap(), "no markers here");
}

#[test]
fn missing_slot_warns_but_still_prints_output() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("doc.md");
    fs::write(&doc, "A <!-- slot: x --> B").unwrap();

    weave_cmd()
        .args(["compose", doc.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("A <!-- slot: x --> B"))
        .stderr(predicate::str::contains("Warning:"))
        .stderr(predicate::str::contains("no slot value supplied"));
}

#[test]
fn missing_slot_error_policy_fails_the_command() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("doc.md");
    fs::write(&doc, "A <!-- slot: x --> B").unwrap();

    weave_cmd()
        .args([
            "compose",
            doc.to_str().unwrap(),
            "--on-missing-slot",
            "error",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn absent_document_with_throw_policy_fails() {
    weave_cmd()
        .args([
            "compose",
            "definitely-not-here.md",
            "--on-file-error",
            "throw",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn bad_slots_json_is_a_validation_error() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("doc.md");
    let slots = dir.path().join("slots.json");
    fs::write(&doc, "text").unwrap();
    fs::write(&slots, r#"{"a": {"text": "t", "source": "s.md"}}"#).unwrap();

    weave_cmd()
        .args([
            "compose",
            doc.to_str().unwrap(),
            "--slots",
            slots.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn inspect_lists_unprotected_placeholders() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("doc.md");
    fs::write(
        &doc,
        "<!-- outlet: shown -->\n```\n<!-- outlet: hidden -->\n```\n",
    )
    .unwrap();

    weave_cmd()
        .args(["inspect", doc.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 placeholder(s)"))
        .stdout(predicate::str::contains("shown"))
        .stdout(predicate::str::contains("1 protected region(s)"));
}

#[test]
fn inspect_missing_file_fails() {
    weave_cmd()
        .args(["inspect", "definitely-not-here.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
