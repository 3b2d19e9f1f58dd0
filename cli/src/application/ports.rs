//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `tfcheck_common`, never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tfcheck_common::{KeyPair, ProvisioningOptions};

use crate::domain::config::HarnessConfig;

// ── Value Types ───────────────────────────────────────────────────────────────

/// One HTTP response as seen by a verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Everything needed to open an authenticated remote session.
#[derive(Debug, Clone)]
pub struct RemoteHost {
    /// IP address or DNS name.
    pub hostname: String,
    /// Login user, e.g. `"ec2-user"`.
    pub user: String,
    pub key_pair: KeyPair,
}

// ── Provisioning Port ─────────────────────────────────────────────────────────

/// The infrastructure-as-code tool: converge, tear down, read outputs.
#[allow(async_fn_in_trait)]
pub trait Provisioner {
    /// Initialise the working directory and converge infrastructure to the
    /// definitions. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::CommandFailed` if init or apply fails.
    async fn init_and_apply(&self, opts: &ProvisioningOptions) -> Result<()>;

    /// Destroy everything the definitions created.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::CommandFailed` if destroy fails.
    async fn destroy(&self, opts: &ProvisioningOptions) -> Result<()>;

    /// Read a named output value after a successful apply.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::OutputMissing` if the output does not exist.
    async fn output(&self, opts: &ProvisioningOptions, key: &str) -> Result<String>;
}

// ── Credential Port ───────────────────────────────────────────────────────────

/// Cloud key-pair registry.
#[allow(async_fn_in_trait)]
pub trait CredentialApi {
    /// Generate a key pair locally and register its public half remotely.
    async fn create_and_import_key_pair(&self, region: &str, name: &str) -> Result<KeyPair>;
    /// Deregister a key pair. A key pair that is already gone counts as deleted.
    async fn delete_key_pair(&self, key_pair: &KeyPair) -> Result<()>;
}

// ── Transport Ports ───────────────────────────────────────────────────────────

/// A single HTTP GET, no retries.
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    /// Non-2xx statuses are returned as responses, not errors. Errors are
    /// transport failures only.
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Run one command in a fresh authenticated session on a remote host.
#[allow(async_fn_in_trait)]
pub trait RemoteShell {
    /// Returns the command's stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be established or the command
    /// exits non-zero.
    async fn execute(&self, host: &RemoteHost, command: &str) -> Result<String>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Like `run_with_timeout`, with extra environment variables for the child.
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

/// Reporter that discards everything. Used by tests and `--quiet` JSON runs.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts harness configuration loading.
pub trait ConfigStore {
    /// Load the configuration. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// validated.
    fn load(&self) -> Result<HarnessConfig>;

    /// Path of the configuration file, whether or not it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}

// ── State Port ────────────────────────────────────────────────────────────────

/// Durable key → record persistence shared by stages of one run.
#[allow(async_fn_in_trait)]
pub trait StateStore {
    /// Persist `value` under `key`, replacing any previous value.
    async fn save<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()>;
    /// Load the value saved under `key`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Missing` if nothing was ever saved.
    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T>;
    /// Whether a value exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;
    /// Remove the value under `key`, if any.
    async fn clear(&self, key: &str) -> Result<()>;
    /// Remove every persisted value for this scope.
    async fn clean(&self) -> Result<()>;
}
