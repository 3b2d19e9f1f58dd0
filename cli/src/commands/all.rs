//! `tfcheck all` — both scenarios side by side.

use anyhow::{Result, anyhow, bail};

use crate::app::AppContext;
use crate::commands::ssh::SshArgs;
use crate::commands::{ScenarioFailed, http, ssh};
use crate::output::TerminalReporter;

/// Run `tfcheck all`.
///
/// The scenarios run concurrently on one task and share nothing but the
/// definitions: HTTP applies in place, SSH in a temporary copy.
///
/// # Errors
///
/// Returns an error naming every scenario that failed.
pub async fn run(app: &AppContext, args: &SshArgs) -> Result<()> {
    if args.scenario.skips().any() {
        bail!(
            "stage skips keep the SSH scenario in the terraform folder, where the HTTP \
             scenario also runs. Run `tfcheck http` and `tfcheck ssh` separately instead."
        );
    }

    let http_reporter = TerminalReporter::labelled(&app.output, "http");
    let ssh_reporter = TerminalReporter::labelled(&app.output, "ssh");
    let (http_outcome, ssh_outcome) = tokio::join!(
        http::execute(app, &args.scenario, &http_reporter),
        ssh::execute(app, args, &ssh_reporter),
    );
    let (http_report, http_result) = http_outcome?;
    let (ssh_report, ssh_result) = ssh_outcome?;

    app.renderer().render_reports(&[http_report, ssh_report])?;

    match (http_result, ssh_result) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(err), Ok(())) => Err(err.context(ScenarioFailed("http scenario".to_string()))),
        (Ok(()), Err(err)) => Err(err.context(ScenarioFailed("ssh scenario".to_string()))),
        (Err(http_err), Err(ssh_err)) => Err(anyhow!(
            "http: {http_err:#}\n\nssh: {ssh_err:#}"
        )
        .context(ScenarioFailed("http and ssh scenarios".to_string()))),
    }
}
