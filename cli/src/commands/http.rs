//! `tfcheck http` — provision, poll the HTTP endpoint, destroy.

use std::time::Duration;

use anyhow::Result;
use tfcheck_common::{ProvisioningOptions, ScenarioKind, ScenarioReport};

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::http_scenario::{HttpScenario, run_http_scenario};
use crate::application::stage::StageRunner;
use crate::commands::{ScenarioArgs, ScenarioFailed, terraform};
use crate::domain::verify::HttpExpectation;
use crate::infra::http::UreqHttpClient;
use crate::output::TerminalReporter;

/// Run `tfcheck http`.
///
/// # Errors
///
/// Returns the scenario's failure after the report has been rendered.
pub async fn run(app: &AppContext, args: &ScenarioArgs) -> Result<()> {
    let reporter = TerminalReporter::new(&app.output);
    let (report, result) = execute(app, args, &reporter).await?;
    drop(reporter);
    app.renderer().render_reports(std::slice::from_ref(&report))?;
    result.map_err(|err| err.context(ScenarioFailed("http scenario".to_string())))
}

/// Run the scenario and describe what happened. The outer `Result` fails
/// only if the scenario could not be started.
pub(crate) async fn execute(
    app: &AppContext,
    args: &ScenarioArgs,
    reporter: &dyn ProgressReporter,
) -> Result<(ScenarioReport, Result<()>)> {
    let config = &app.config;
    let scenario = HttpScenario {
        options: ProvisioningOptions::new(args.terraform_dir(config)),
        output_key: config.http.output.clone(),
        expectation: HttpExpectation {
            status: config.http.expected_status,
            body: config.http.expected_body.clone(),
            mode: config.http.body_match,
        },
        policy: args.policy(config)?,
    };
    let provisioner = terraform(config);
    let client = UreqHttpClient::new(Duration::from_secs(config.http.request_timeout_secs));

    let mut runner = StageRunner::new(args.skips(), reporter);
    let result = run_http_scenario(&provisioner, &client, &scenario, &mut runner).await;

    let report = ScenarioReport {
        scenario: ScenarioKind::Http,
        run_id: None,
        stages: runner.records().to_vec(),
        succeeded: result.is_ok(),
    };
    Ok((report, result))
}
