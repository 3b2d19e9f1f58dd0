//! Command implementations

pub mod all;
pub mod clean;
pub mod http;
pub mod ssh;
pub mod version;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Args;
use tfcheck_common::Stage;

use crate::application::retry::RetryPolicy;
use crate::application::stage::skips_from_env;
use crate::domain::config::HarnessConfig;
use crate::domain::error::ConfigError;
use crate::domain::stage::StageSkips;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::terraform::TerraformCli;

/// Context on a scenario failure whose report has already been rendered.
///
/// `main` checks for it so `--json` prints one document, not two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioFailed(pub String);

impl fmt::Display for ScenarioFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", self.0)
    }
}

/// Arguments shared by every scenario command.
#[derive(Args, Debug, Clone, Default)]
pub struct ScenarioArgs {
    /// Terraform folder [default: terraform.dir from config, ./terraform]
    #[arg(long, env = "TFCHECK_TERRAFORM_DIR", value_name = "DIR")]
    pub terraform_dir: Option<PathBuf>,

    /// Skip a stage; repeatable. `SKIP_<stage>` env vars work too
    #[arg(long = "skip", value_enum, value_name = "STAGE")]
    pub skip: Vec<Stage>,

    /// Verification attempts before giving up
    #[arg(long, value_name = "N")]
    pub attempts: Option<u32>,

    /// Seconds between verification attempts
    #[arg(long, value_name = "SECS")]
    pub delay: Option<u64>,
}

impl ScenarioArgs {
    /// Skips from the environment plus `--skip` flags.
    #[must_use]
    pub fn skips(&self) -> StageSkips {
        self.skip
            .iter()
            .fold(skips_from_env(), |skips, stage| skips.with(*stage))
    }

    /// Verification retry policy: flags override config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for `--attempts 0`.
    pub fn policy(&self, config: &HarnessConfig) -> Result<RetryPolicy> {
        let attempts = self.attempts.unwrap_or(config.retry.attempts);
        if attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "--attempts".to_string(),
                value: "0".to_string(),
                hint: "At least one attempt is required.".to_string(),
            }
            .into());
        }
        let delay = self
            .delay
            .map_or_else(|| config.retry.delay(), Duration::from_secs);
        Ok(RetryPolicy::new(attempts, delay))
    }

    #[must_use]
    pub fn terraform_dir(&self, config: &HarnessConfig) -> PathBuf {
        self.terraform_dir
            .clone()
            .unwrap_or_else(|| config.terraform.dir.clone())
    }
}

/// `terraform` adapter with the configured binary and timeouts.
pub(crate) fn terraform(config: &HarnessConfig) -> TerraformCli<TokioCommandRunner> {
    let command_timeout = Duration::from_secs(config.terraform.command_timeout_secs);
    TerraformCli::new(
        TokioCommandRunner::new(command_timeout),
        config.terraform.binary.clone(),
    )
    .with_timeouts(
        Duration::from_secs(config.terraform.apply_timeout_secs),
        command_timeout,
    )
}

/// Split `dir` into its parent and final component, e.g. `./terraform` into
/// `.` and `terraform`.
pub(crate) fn split_module(dir: &Path) -> Result<(PathBuf, String)> {
    let module = dir
        .file_name()
        .ok_or_else(|| anyhow!("terraform folder {} has no final component", dir.display()))?
        .to_string_lossy()
        .into_owned();
    let root = dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((root, module))
}
