//! `CredentialApi` adapter: `ssh-keygen` for key material, the `aws` CLI for
//! the EC2 key-pair registry.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tfcheck_common::KeyPair;
use tracing::{info, warn};

use crate::application::ports::{CommandRunner, CredentialApi};

const KEY_FILE: &str = "id_ed25519";

/// EC2 error code for a key pair that does not exist.
const NOT_FOUND_CODE: &str = "InvalidKeyPair.NotFound";

pub struct AwsKeyPairs<R: CommandRunner> {
    runner: R,
    aws_binary: String,
    keygen_binary: String,
}

impl<R: CommandRunner> AwsKeyPairs<R> {
    pub fn new(runner: R, aws_binary: impl Into<String>, keygen_binary: impl Into<String>) -> Self {
        Self {
            runner,
            aws_binary: aws_binary.into(),
            keygen_binary: keygen_binary.into(),
        }
    }

    async fn generate(&self, dir: &Path, comment: &str) -> Result<(String, String)> {
        let key_path = dir.join(KEY_FILE);
        let key_arg = key_path.to_string_lossy().into_owned();
        let output = self
            .runner
            .run(
                &self.keygen_binary,
                &["-q", "-t", "ed25519", "-N", "", "-C", comment, "-f", key_arg.as_str()],
            )
            .await?;
        ensure_success(&self.keygen_binary, &output)?;

        let pub_path = key_path.with_extension("pub");
        tokio::task::spawn_blocking(move || -> Result<(String, String)> {
            let private_key = std::fs::read_to_string(&key_path)
                .with_context(|| format!("reading {}", key_path.display()))?;
            let public_key = std::fs::read_to_string(&pub_path)
                .with_context(|| format!("reading {}", pub_path.display()))?;
            Ok((public_key.trim().to_string(), private_key))
        })
        .await
        .context("key read task panicked")?
    }
}

/// `aws ec2 import-key-pair` arguments.
#[must_use]
pub fn import_key_pair_args(region: &str, name: &str, public_key_file: &Path) -> Vec<String> {
    vec![
        "ec2".to_string(),
        "import-key-pair".to_string(),
        "--region".to_string(),
        region.to_string(),
        "--key-name".to_string(),
        name.to_string(),
        "--public-key-material".to_string(),
        format!("fileb://{}", public_key_file.display()),
    ]
}

/// `aws ec2 delete-key-pair` arguments.
#[must_use]
pub fn delete_key_pair_args(region: &str, name: &str) -> Vec<String> {
    vec![
        "ec2".to_string(),
        "delete-key-pair".to_string(),
        "--region".to_string(),
        region.to_string(),
        "--key-name".to_string(),
        name.to_string(),
    ]
}

impl<R: CommandRunner> CredentialApi for AwsKeyPairs<R> {
    async fn create_and_import_key_pair(&self, region: &str, name: &str) -> Result<KeyPair> {
        let dir = tempfile::Builder::new()
            .prefix("tfcheck-key-")
            .tempdir()
            .context("creating temporary key directory")?;
        let (public_key, private_key) = self.generate(dir.path(), name).await?;

        let pub_path: PathBuf = dir.path().join(KEY_FILE).with_extension("pub");
        let args = import_key_pair_args(region, name, &pub_path);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.runner.run(&self.aws_binary, &args).await?;
        ensure_success("aws ec2 import-key-pair", &output)?;
        info!(name, region, "imported EC2 key pair");

        Ok(KeyPair {
            name: name.to_string(),
            region: region.to_string(),
            public_key,
            private_key,
            created_at: Utc::now(),
        })
    }

    async fn delete_key_pair(&self, key_pair: &KeyPair) -> Result<()> {
        let args = delete_key_pair_args(&key_pair.region, &key_pair.name);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.runner.run(&self.aws_binary, &args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains(NOT_FOUND_CODE) {
                warn!(name = %key_pair.name, "key pair already deleted");
                return Ok(());
            }
        }
        ensure_success("aws ec2 delete-key-pair", &output)?;
        info!(name = %key_pair.name, region = %key_pair.region, "deleted EC2 key pair");
        Ok(())
    }
}

fn ensure_success(what: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!(
        "{what} failed (exit code {}): {}",
        output.status.code().unwrap_or(-1),
        stderr.trim()
    )
}
