//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod stage;
pub mod terraform;
pub mod verify;

pub use config::{BodyMatchMode, HarnessConfig};
pub use error::{
    ConfigError, FailedWithTeardown, PersistenceError, ProvisionError, RetryError, TeardownFailed,
    VerificationFailed,
};
pub use stage::{StageSkips, generate_run_id, key_pair_name};
pub use verify::{HttpExpectation, check_command_output, echo_command};
