//! Domain types and validators for harness configuration.
//!
//! Pure functions only. No I/O or async.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.tfcheck/config.yaml`.
///
/// Every section is optional; missing keys take the defaults the scenarios
/// were written against.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    pub terraform: TerraformConfig,
    pub retry: RetryConfig,
    pub http: HttpConfig,
    pub ssh: SshConfig,
    pub aws: AwsConfig,
}

/// How to invoke terraform and where the definitions live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TerraformConfig {
    pub binary: String,
    /// Directory holding the `.tf` files.
    pub dir: PathBuf,
    /// Upper bound for `init`, `apply` and `destroy`.
    pub apply_timeout_secs: u64,
    /// Upper bound for quick commands such as `output`.
    pub command_timeout_secs: u64,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: "terraform".to_string(),
            dir: PathBuf::from("./terraform"),
            apply_timeout_secs: 30 * 60,
            command_timeout_secs: 60,
        }
    }
}

/// Polling budget for verifiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 30,
            delay_secs: 5,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

/// How the HTTP response body is compared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BodyMatchMode {
    #[default]
    Exact,
    Contains,
}

/// HTTP scenario settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    /// Terraform output holding the URL.
    pub output: String,
    pub expected_status: u16,
    pub expected_body: String,
    pub body_match: BodyMatchMode,
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            output: "alb_url".to_string(),
            expected_status: 200,
            expected_body: "Hello!!!".to_string(),
            body_match: BodyMatchMode::Exact,
            request_timeout_secs: 10,
        }
    }
}

/// SSH scenario settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SshConfig {
    /// Terraform output holding the public IP.
    pub output: String,
    pub user: String,
    pub region: String,
    /// Key pairs are named `<prefix>-<run id>`.
    pub key_name_prefix: String,
    /// Text the remote `echo` must produce.
    pub expected_text: String,
    pub binary: String,
    pub keygen_binary: String,
    pub connect_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            output: "ssh_ip_address".to_string(),
            user: "ec2-user".to_string(),
            region: "ap-northeast-1".to_string(),
            key_name_prefix: "terratest-ssh-key".to_string(),
            expected_text: "Hello!!!".to_string(),
            binary: "ssh".to_string(),
            keygen_binary: "ssh-keygen".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// AWS CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AwsConfig {
    pub binary: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            binary: "aws".to_string(),
        }
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

impl HarnessConfig {
    /// Reject values no scenario can run with.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<()> {
        if self.retry.attempts == 0 {
            return Err(invalid("retry.attempts", "0", "At least one attempt is required.").into());
        }
        if !(100..=599).contains(&self.http.expected_status) {
            return Err(invalid(
                "http.expected_status",
                &self.http.expected_status.to_string(),
                "Must be an HTTP status code between 100 and 599.",
            )
            .into());
        }
        for (key, value) in [
            ("terraform.binary", &self.terraform.binary),
            ("http.output", &self.http.output),
            ("ssh.output", &self.ssh.output),
            ("ssh.user", &self.ssh.user),
            ("ssh.region", &self.ssh.region),
            ("ssh.key_name_prefix", &self.ssh.key_name_prefix),
            ("aws.binary", &self.aws.binary),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(key, value, "Must not be empty.").into());
            }
        }
        if !self
            .ssh
            .key_name_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid(
                "ssh.key_name_prefix",
                &self.ssh.key_name_prefix,
                "Only letters, digits, '-' and '_' are allowed.",
            )
            .into());
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str, hint: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        hint: hint.to_string(),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
