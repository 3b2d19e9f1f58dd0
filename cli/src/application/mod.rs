//! Application layer — port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod ports;
pub mod retry;
pub mod services;
pub mod stage;

pub use ports::{
    CommandRunner, ConfigStore, CredentialApi, HttpClient, HttpResponse, ProgressReporter, Provisioner,
    RemoteHost, RemoteShell, SilentReporter, StateStore,
};
pub use retry::{RetryPolicy, do_with_retry, do_with_retryable_errors};
pub use stage::{StageRunner, skips_from_env};
