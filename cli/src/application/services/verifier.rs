//! Application service — remote verifiers.
//!
//! A verifier checks remote state once. [`verify_with_retry`] turns a single
//! check into a poll under a [`RetryPolicy`].

use anyhow::Result;
use tracing::debug;

use crate::application::ports::{HttpClient, RemoteHost, RemoteShell};
use crate::application::retry::{RetryPolicy, do_with_retry};
use crate::domain::verify::{HttpExpectation, check_command_output};

/// Check remote state once.
#[allow(async_fn_in_trait)]
pub trait Verifier {
    /// Human-readable name used in logs and retry errors.
    fn description(&self) -> String;

    /// # Errors
    ///
    /// Returns `VerificationFailed` on a mismatch, or the transport error if
    /// the remote could not be reached. Both count as a failed attempt.
    async fn verify(&self) -> Result<()>;
}

/// GET a URL and compare status and body.
pub struct HttpVerifier<'a, C: HttpClient> {
    client: &'a C,
    url: String,
    expectation: HttpExpectation,
}

impl<'a, C: HttpClient> HttpVerifier<'a, C> {
    pub fn new(client: &'a C, url: impl Into<String>, expectation: HttpExpectation) -> Self {
        Self {
            client,
            url: url.into(),
            expectation,
        }
    }
}

impl<C: HttpClient> Verifier for HttpVerifier<'_, C> {
    fn description(&self) -> String {
        format!("HTTP GET {}", self.url)
    }

    async fn verify(&self) -> Result<()> {
        let response = self.client.get(&self.url).await?;
        debug!(url = %self.url, status = response.status, "received response");
        self.expectation.check(response.status, &response.body)?;
        Ok(())
    }
}

/// Run a fixed command on a remote host and compare its output.
pub struct CommandVerifier<'a, S: RemoteShell> {
    shell: &'a S,
    host: RemoteHost,
    command: String,
    expected: String,
}

impl<'a, S: RemoteShell> CommandVerifier<'a, S> {
    pub fn new(
        shell: &'a S,
        host: RemoteHost,
        command: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            shell,
            host,
            command: command.into(),
            expected: expected.into(),
        }
    }
}

impl<S: RemoteShell> Verifier for CommandVerifier<'_, S> {
    fn description(&self) -> String {
        format!(
            "SSH to {}@{}: {}",
            self.host.user, self.host.hostname, self.command
        )
    }

    async fn verify(&self) -> Result<()> {
        let output = self.shell.execute(&self.host, &self.command).await?;
        check_command_output(&output, &self.expected)?;
        Ok(())
    }
}

/// Poll `verifier` until it passes or the policy is exhausted.
///
/// # Errors
///
/// Returns `RetryError::Exhausted` carrying the last mismatch.
pub async fn verify_with_retry(verifier: &impl Verifier, policy: RetryPolicy) -> Result<()> {
    let description = verifier.description();
    do_with_retry(&description, policy, || verifier.verify()).await?;
    Ok(())
}
