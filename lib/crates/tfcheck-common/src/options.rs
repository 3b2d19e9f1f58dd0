use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters handed to `terraform` for one run.
///
/// Created once during setup, persisted under `TerraformOptions`, and
/// reloaded unchanged by later stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProvisioningOptions {
    /// Directory holding the `.tf` definitions.
    pub terraform_dir: PathBuf,
    /// Input variables, passed as `-var name=value`.
    #[serde(default)]
    pub vars: BTreeMap<String, Value>,
    /// Extra `-var-file` arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub var_files: Vec<PathBuf>,
    /// Environment for the terraform process.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env_vars: BTreeMap<String, String>,
    #[serde(default)]
    pub no_color: bool,
    /// Regex → description of terraform failures worth retrying.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub retryable_errors: BTreeMap<String, String>,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default, with = "duration_secs")]
    pub time_between_retries: Duration,
}

impl ProvisioningOptions {
    /// Options for `dir` with no variables and no retryable errors.
    pub fn new(terraform_dir: impl AsRef<Path>) -> Self {
        Self {
            terraform_dir: terraform_dir.as_ref().to_path_buf(),
            vars: BTreeMap::new(),
            var_files: Vec::new(),
            env_vars: BTreeMap::new(),
            no_color: true,
            retryable_errors: BTreeMap::new(),
            max_retries: 0,
            time_between_retries: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.var_files.push(path.into());
        self
    }

    /// Retry the well-known transient terraform failures 3 times, 5 seconds apart.
    #[must_use]
    pub fn with_default_retryable_errors(mut self) -> Self {
        self.retryable_errors = default_retryable_errors();
        self.max_retries = 3;
        self.time_between_retries = Duration::from_secs(5);
        self
    }
}

/// Terraform failures caused by flaky networks or eventually consistent
/// cloud APIs rather than by the definitions themselves.
#[must_use]
pub fn default_retryable_errors() -> BTreeMap<String, String> {
    [
        (
            "(?s).*Error installing provider.*TLS handshake timeout.*",
            "Provider installation failed due to a transient network error.",
        ),
        (
            "(?s).*Error installing provider.*tcp.*timeout.*",
            "Provider installation failed due to a transient network error.",
        ),
        (
            "(?s).*Error installing provider.*tcp.*connection reset by peer.*",
            "Provider installation failed due to a transient network error.",
        ),
        (
            "(?s).*Error configuring the backend.*TLS handshake timeout.*",
            "Backend configuration failed due to a transient network error.",
        ),
        (
            "(?s).*Failed to load state.*tcp.*timeout.*",
            "Loading state failed due to a transient network error.",
        ),
        (
            "(?s).*Failed to load backend.*TLS handshake timeout.*",
            "Loading the backend failed due to a transient network error.",
        ),
        (
            "(?s).*Creating metric alarm failed.*request to update this alarm is in progress.*",
            "CloudWatch alarm update already in progress.",
        ),
        (
            "NoSuchBucket: The specified bucket does not exist",
            "S3 bucket not visible yet (eventual consistency).",
        ),
        (
            "(?s).*Error creating SSM parameter: TooManyUpdates:.*",
            "SSM parameter updated concurrently.",
        ),
        (
            "(?s).*app.terraform.io.*: 500 Internal Server Error.*",
            "Terraform Cloud returned a transient server error.",
        ),
        (
            "(?s).*error uploading file to S3.*",
            "S3 upload failed transiently.",
        ),
    ]
    .into_iter()
    .map(|(pattern, description)| (pattern.to_string(), description.to_string()))
    .collect()
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
