//! `Provisioner` adapter backed by the `terraform` CLI.

use std::collections::BTreeMap;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use tfcheck_common::ProvisioningOptions;
use tracing::info;

use crate::application::ports::{CommandRunner, Provisioner};
use crate::application::retry::do_with_retryable_errors;
use crate::domain::error::ProvisionError;
use crate::domain::terraform::{
    apply_args, destroy_args, init_args, is_missing_output, output_args,
};
use crate::infra::command_runner::{DEFAULT_APPLY_TIMEOUT, DEFAULT_CMD_TIMEOUT};

/// Drives `terraform` through a [`CommandRunner`].
pub struct TerraformCli<R: CommandRunner> {
    runner: R,
    binary: String,
    apply_timeout: Duration,
    command_timeout: Duration,
}

impl<R: CommandRunner> TerraformCli<R> {
    pub fn new(runner: R, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
            apply_timeout: DEFAULT_APPLY_TIMEOUT,
            command_timeout: DEFAULT_CMD_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeouts(mut self, apply: Duration, command: Duration) -> Self {
        self.apply_timeout = apply;
        self.command_timeout = command;
        self
    }

    async fn exec(
        &self,
        opts: &ProvisioningOptions,
        args: &[String],
        timeout: Duration,
    ) -> Result<Output> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let mut env: BTreeMap<String, String> = opts.env_vars.clone();
        env.entry("TF_IN_AUTOMATION".to_string())
            .or_insert_with(|| "1".to_string());
        self.runner
            .run_with_env(&self.binary, &args, &env, timeout)
            .await
    }

    /// Run one subcommand, retrying the options' known transient failures.
    async fn converge(
        &self,
        opts: &ProvisioningOptions,
        command: &str,
        args: Vec<String>,
        timeout: Duration,
    ) -> Result<()> {
        let description = format!("terraform {command}");
        let args = &args;
        do_with_retryable_errors(
            &description,
            &opts.retryable_errors,
            opts.max_retries,
            opts.time_between_retries,
            || async move {
                let output = self.exec(opts, args, timeout).await?;
                check_success(command, &output)?;
                Ok(())
            },
        )
        .await
    }
}

impl<R: CommandRunner> Provisioner for TerraformCli<R> {
    async fn init_and_apply(&self, opts: &ProvisioningOptions) -> Result<()> {
        info!(dir = %opts.terraform_dir.display(), "terraform init");
        self.converge(opts, "init", init_args(opts), self.apply_timeout)
            .await?;
        info!(dir = %opts.terraform_dir.display(), "terraform apply");
        self.converge(opts, "apply", apply_args(opts), self.apply_timeout)
            .await
    }

    async fn destroy(&self, opts: &ProvisioningOptions) -> Result<()> {
        info!(dir = %opts.terraform_dir.display(), "terraform destroy");
        self.converge(opts, "destroy", destroy_args(opts), self.apply_timeout)
            .await
    }

    async fn output(&self, opts: &ProvisioningOptions, key: &str) -> Result<String> {
        let output = self
            .exec(opts, &output_args(opts, key), self.command_timeout)
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_missing_output(&stderr) {
                return Err(ProvisionError::OutputMissing {
                    key: key.to_string(),
                    dir: opts.terraform_dir.clone(),
                }
                .into());
            }
            check_success("output", &output)?;
        }
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            return Err(ProvisionError::OutputMissing {
                key: key.to_string(),
                dir: opts.terraform_dir.clone(),
            }
            .into());
        }
        Ok(value)
    }
}

fn check_success(command: &str, output: &Output) -> Result<(), ProvisionError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stderr = if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    };
    Err(ProvisionError::CommandFailed {
        command: command.to_string(),
        code: output.status.code().unwrap_or(-1),
        stderr,
    })
}
