//! Full scenarios against real infrastructure.
//!
//! Requires `terraform`, the `aws` CLI, `ssh`, credentials for an account
//! you can create resources in, and definitions in `./terraform` (or
//! `TFCHECK_TERRAFORM_DIR`) exposing `alb_url` and `ssh_ip_address`.
//! Run with `cargo test --test integration -- --ignored`.

#![allow(clippy::expect_used)]

use std::time::Duration;

use assert_cmd::Command;

fn tfcheck() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tfcheck"));
    cmd.env("NO_COLOR", "1").timeout(Duration::from_secs(45 * 60));
    cmd
}

fn terraform_dir() -> String {
    std::env::var("TFCHECK_TERRAFORM_DIR").unwrap_or_else(|_| {
        concat!(env!("CARGO_MANIFEST_DIR"), "/../terraform").to_string()
    })
}

#[test]
#[ignore = "provisions real AWS resources"]
fn test_http_scenario_end_to_end() {
    let output = tfcheck()
        .args(["http", "--json", "--terraform-dir", &terraform_dir()])
        .output()
        .expect("run");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON report");
    assert_eq!(report["succeeded"], true, "{report:#}");
    assert!(output.status.success());
}

#[test]
#[ignore = "provisions real AWS resources"]
fn test_ssh_scenario_end_to_end() {
    let output = tfcheck()
        .args(["ssh", "--json", "--terraform-dir", &terraform_dir()])
        .output()
        .expect("run");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON report");
    assert_eq!(report["succeeded"], true, "{report:#}");
    let stages = report["scenarios"][0]["stages"]
        .as_array()
        .expect("stage list");
    assert_eq!(stages.len(), 3);
}
