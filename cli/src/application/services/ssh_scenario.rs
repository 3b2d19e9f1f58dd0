//! Application service — SSH scenario with persisted cross-stage state.
//!
//! Setup creates a key pair and infrastructure, validate runs a command on
//! the new host, teardown removes both. Stages communicate only through the
//! [`StateStore`], so each one can run in a separate invocation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tfcheck_common::{EC2_KEY_PAIR, KeyPair, ProvisioningOptions, TERRAFORM_OPTIONS};
use tracing::{debug, info, warn};

use crate::application::ports::{CredentialApi, Provisioner, RemoteHost, RemoteShell, StateStore};
use crate::application::retry::RetryPolicy;
use crate::application::services::verifier::{CommandVerifier, verify_with_retry};
use crate::application::stage::StageRunner;
use crate::domain::error::TeardownFailed;
use crate::domain::verify::echo_command;

/// Inputs for one SSH scenario run.
#[derive(Debug, Clone)]
pub struct SshScenario {
    /// Working copy of the Terraform definitions.
    pub terraform_dir: PathBuf,
    pub region: String,
    /// Name for a newly created key pair. Later stages use the persisted one.
    pub key_pair_name: String,
    /// Terraform output holding the host address.
    pub output_key: String,
    pub user: String,
    pub expected_text: String,
    pub policy: RetryPolicy,
}

/// The ports the SSH scenario talks to.
pub struct SshPorts<'a, P, K, S, St> {
    pub provisioner: &'a P,
    pub credentials: &'a K,
    pub shell: &'a S,
    pub store: &'a St,
}

/// Run setup, validate and teardown through `runner`.
///
/// # Errors
///
/// Returns the first stage failure; see [`StageRunner::run_scenario`].
pub async fn run_ssh_scenario<P, K, S, St>(
    ports: &SshPorts<'_, P, K, S, St>,
    scenario: &SshScenario,
    runner: &mut StageRunner<'_>,
) -> Result<()>
where
    P: Provisioner,
    K: CredentialApi,
    S: RemoteShell,
    St: StateStore,
{
    runner
        .run_scenario(
            || setup(ports.provisioner, ports.credentials, ports.store, scenario),
            || validate(ports.provisioner, ports.shell, ports.store, scenario),
            || teardown(ports.provisioner, ports.credentials, ports.store),
        )
        .await
}

/// Create and import a key pair, persist it with the options, then apply.
///
/// Both records are saved before apply so teardown can clean up a partial
/// apply.
///
/// # Errors
///
/// Returns an error if key creation, persistence, or apply fails.
pub async fn setup(
    provisioner: &impl Provisioner,
    credentials: &impl CredentialApi,
    store: &impl StateStore,
    scenario: &SshScenario,
) -> Result<()> {
    let key_pair = credentials
        .create_and_import_key_pair(&scenario.region, &scenario.key_pair_name)
        .await
        .with_context(|| format!("creating key pair {}", scenario.key_pair_name))?;
    info!(key_pair = %key_pair.name, region = %key_pair.region, "key pair imported");
    store.save(EC2_KEY_PAIR, &key_pair).await?;

    let options = ProvisioningOptions::new(&scenario.terraform_dir)
        .with_var("key_pair_name", key_pair.name.clone())
        .with_default_retryable_errors();
    store.save(TERRAFORM_OPTIONS, &options).await?;

    provisioner.init_and_apply(&options).await
}

/// Reload state, read the host address, and poll the echo command.
///
/// # Errors
///
/// Returns `PersistenceError::Missing` if setup never ran here, or
/// `RetryError::Exhausted` if the host never answered as expected.
pub async fn validate(
    provisioner: &impl Provisioner,
    shell: &impl RemoteShell,
    store: &impl StateStore,
    scenario: &SshScenario,
) -> Result<()> {
    let options: ProvisioningOptions = store.load(TERRAFORM_OPTIONS).await?;
    let key_pair: KeyPair = store.load(EC2_KEY_PAIR).await?;

    let hostname = provisioner.output(&options, &scenario.output_key).await?;
    info!(%hostname, user = %scenario.user, "verifying SSH access");

    let host = RemoteHost {
        hostname,
        user: scenario.user.clone(),
        key_pair,
    };
    let command = echo_command(&scenario.expected_text);
    let verifier = CommandVerifier::new(shell, host, command, scenario.expected_text.clone());
    verify_with_retry(&verifier, scenario.policy).await
}

/// Destroy infrastructure, delete the key pair, then clear local state.
///
/// Every step is attempted. Local state is only removed once all remote
/// cleanup succeeded, so a failed teardown can be re-run.
///
/// # Errors
///
/// Returns `TeardownFailed` listing each step that failed.
pub async fn teardown(
    provisioner: &impl Provisioner,
    credentials: &impl CredentialApi,
    store: &impl StateStore,
) -> Result<()> {
    let mut failures: Vec<(String, anyhow::Error)> = Vec::new();

    match load_if_saved::<ProvisioningOptions>(store, TERRAFORM_OPTIONS).await {
        Ok(Some(options)) => {
            if let Err(err) = provisioner.destroy(&options).await {
                failures.push(("terraform destroy".to_string(), err));
            }
        }
        Ok(None) => debug!("no saved terraform options, nothing to destroy"),
        Err(err) => failures.push(("load terraform options".to_string(), err)),
    }

    match load_if_saved::<KeyPair>(store, EC2_KEY_PAIR).await {
        Ok(Some(key_pair)) => {
            if let Err(err) = credentials.delete_key_pair(&key_pair).await {
                failures.push((format!("delete key pair {}", key_pair.name), err));
            }
        }
        Ok(None) => debug!("no saved key pair, nothing to delete"),
        Err(err) => failures.push(("load key pair".to_string(), err)),
    }

    if !failures.is_empty() {
        warn!(failed_steps = failures.len(), "keeping local state for a later teardown");
        return Err(TeardownFailed { failures }.into());
    }
    store.clean().await
}

async fn load_if_saved<T: serde::de::DeserializeOwned>(
    store: &impl StateStore,
    key: &str,
) -> Result<Option<T>> {
    if !store.exists(key).await? {
        return Ok(None);
    }
    store.load(key).await.map(Some)
}
