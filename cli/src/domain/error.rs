//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Failures of the provisioning tool. All of them abort the scenario.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("terraform {command} failed (exit code {code}):\n{stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("terraform output '{key}' does not exist in {}", .dir.display())]
    OutputMissing { key: String, dir: PathBuf },
}

// ── Verification errors ───────────────────────────────────────────────────────

/// A single verification attempt observed the wrong value. Retryable.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{what}: expected {expected}, got {actual}")]
pub struct VerificationFailed {
    /// What was being compared, e.g. `"HTTP status"`.
    pub what: String,
    pub expected: String,
    pub actual: String,
}

impl VerificationFailed {
    pub fn new(
        what: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            what: what.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

// ── Retry errors ──────────────────────────────────────────────────────────────

/// Errors produced by the retry poller.
#[derive(Debug, Error)]
pub enum RetryError {
    #[error("'{description}' unsuccessful after {attempts} attempts: {last:#}")]
    Exhausted {
        description: String,
        attempts: u32,
        last: anyhow::Error,
    },

    #[error("retry policy for '{0}' must allow at least one attempt")]
    InvalidPolicy(String),
}

// ── Persistence errors ────────────────────────────────────────────────────────

/// Errors raised by the state store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(
        "no saved value for '{key}' at {}. Was the setup stage run in this working directory?",
        .path.display()
    )]
    Missing { key: String, path: PathBuf },
}

// ── Teardown errors ───────────────────────────────────────────────────────────

/// Every teardown step runs; this collects the ones that failed.
#[derive(Debug, Error)]
#[error("teardown failed in {} step(s):\n{}", .failures.len(), render_failures(.failures))]
pub struct TeardownFailed {
    pub failures: Vec<(String, anyhow::Error)>,
}

/// The scenario failed and the teardown that followed failed as well.
///
/// The original cause is rendered first; the teardown failure is appended so
/// leaked resources are still reported.
#[derive(Debug, Error)]
#[error("{cause:#}\n\nteardown also failed: {teardown:#}")]
pub struct FailedWithTeardown {
    pub cause: anyhow::Error,
    pub teardown: anyhow::Error,
}

fn render_failures(failures: &[(String, anyhow::Error)]) -> String {
    failures
        .iter()
        .map(|(step, err)| format!("  - {step}: {err:#}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to harness configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}\n\n{hint}")]
    InvalidValue {
        key: String,
        value: String,
        hint: String,
    },
}
