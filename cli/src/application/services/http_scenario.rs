//! Application service — HTTP endpoint scenario.
//!
//! Provision, read the endpoint URL, poll it, destroy. Imports only from
//! `crate::domain` and `crate::application`.

use anyhow::Result;
use tfcheck_common::ProvisioningOptions;
use tracing::info;

use crate::application::ports::{HttpClient, Provisioner};
use crate::application::retry::RetryPolicy;
use crate::application::services::verifier::{HttpVerifier, verify_with_retry};
use crate::application::stage::StageRunner;
use crate::domain::verify::HttpExpectation;

/// Inputs for one HTTP scenario run.
#[derive(Debug, Clone)]
pub struct HttpScenario {
    pub options: ProvisioningOptions,
    /// Terraform output holding the endpoint URL.
    pub output_key: String,
    pub expectation: HttpExpectation,
    pub policy: RetryPolicy,
}

/// Run the HTTP scenario through `runner`.
///
/// Options live in memory only; the definitions are applied in place, so a
/// skipped setup still finds the outputs of an earlier apply.
///
/// # Errors
///
/// Returns the first provisioning or verification failure. Destroy runs on
/// every path unless the teardown stage is skipped.
pub async fn run_http_scenario(
    provisioner: &impl Provisioner,
    client: &impl HttpClient,
    scenario: &HttpScenario,
    runner: &mut StageRunner<'_>,
) -> Result<()> {
    let options = &scenario.options;
    runner
        .run_scenario(
            || provisioner.init_and_apply(options),
            || async move {
                let url = provisioner.output(options, &scenario.output_key).await?;
                info!(%url, "verifying HTTP endpoint");
                let verifier = HttpVerifier::new(client, url, scenario.expectation.clone());
                verify_with_retry(&verifier, scenario.policy).await
            },
            || provisioner.destroy(options),
        )
        .await
}
