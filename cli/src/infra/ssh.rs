//! `RemoteShell` adapter on the system `ssh` client.
//!
//! Each call opens a fresh session. The private key is written to a
//! temporary file readable only by the current user and removed afterwards.

use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::application::ports::{CommandRunner, RemoteHost, RemoteShell};

pub struct SshCli<R: CommandRunner> {
    runner: R,
    binary: String,
    connect_timeout: Duration,
}

impl<R: CommandRunner> SshCli<R> {
    pub fn new(runner: R, binary: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            runner,
            binary: binary.into(),
            connect_timeout,
        }
    }
}

/// `ssh` arguments for one non-interactive command.
///
/// Hosts are freshly provisioned and ephemeral, so host keys are neither
/// checked nor recorded.
#[must_use]
pub fn ssh_args(
    host: &RemoteHost,
    key_file: &Path,
    command: &str,
    connect_timeout: Duration,
) -> Vec<String> {
    let mut args = vec!["-i".to_string(), key_file.display().to_string()];
    for option in [
        "StrictHostKeyChecking=no".to_string(),
        "UserKnownHostsFile=/dev/null".to_string(),
        "BatchMode=yes".to_string(),
        "IdentitiesOnly=yes".to_string(),
        "LogLevel=ERROR".to_string(),
        format!("ConnectTimeout={}", connect_timeout.as_secs().max(1)),
    ] {
        args.push("-o".to_string());
        args.push(option);
    }
    args.push(format!("{}@{}", host.user, host.hostname));
    args.push(command.to_string());
    args
}

fn write_private_key(private_key: &str) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("tfcheck-ssh-")
        .tempfile()
        .context("creating temporary key file")?;
    set_permissions(file.path(), 0o600)?;
    file.write_all(private_key.as_bytes())
        .context("writing temporary key file")?;
    if !private_key.ends_with('\n') {
        file.write_all(b"\n").context("writing temporary key file")?;
    }
    file.flush().context("writing temporary key file")?;
    Ok(file)
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

impl<R: CommandRunner> RemoteShell for SshCli<R> {
    async fn execute(&self, host: &RemoteHost, command: &str) -> Result<String> {
        let key_file = write_private_key(&host.key_pair.private_key)?;
        let args = ssh_args(host, key_file.path(), command, self.connect_timeout);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        debug!(host = %host.hostname, user = %host.user, command, "running remote command");

        let output = self.runner.run(&self.binary, &args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "ssh {}@{} exited with code {}: {}",
                host.user,
                host.hostname,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
