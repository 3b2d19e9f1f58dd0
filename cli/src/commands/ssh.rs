//! `tfcheck ssh` — key pair, host, remote command, teardown.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tfcheck_common::{ScenarioKind, ScenarioReport, Stage, StageStatus};
use tracing::{debug, warn};

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::ssh_scenario::{SshPorts, SshScenario, run_ssh_scenario};
use crate::application::stage::StageRunner;
use crate::commands::{ScenarioArgs, ScenarioFailed, split_module, terraform};
use crate::domain::stage::{generate_run_id, key_pair_name};
use crate::infra::aws::AwsKeyPairs;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::ssh::SshCli;
use crate::infra::state::FileStateStore;
use crate::infra::workdir::copy_terraform_folder_to_temp;
use crate::output::TerminalReporter;

/// Arguments for `tfcheck ssh` and `tfcheck all`.
#[derive(Args, Debug, Clone, Default)]
pub struct SshArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// AWS region for the key pair [default: ssh.region from config]
    #[arg(long, env = "AWS_REGION", value_name = "REGION")]
    pub region: Option<String>,
}

/// Run `tfcheck ssh`.
///
/// # Errors
///
/// Returns the scenario's failure after the report has been rendered.
pub async fn run(app: &AppContext, args: &SshArgs) -> Result<()> {
    let reporter = TerminalReporter::new(&app.output);
    let (report, result) = execute(app, args, &reporter).await?;
    drop(reporter);
    app.renderer().render_reports(std::slice::from_ref(&report))?;
    result.map_err(|err| err.context(ScenarioFailed("ssh scenario".to_string())))
}

/// Run the scenario and describe what happened. The outer `Result` fails
/// only if the scenario could not be started.
pub(crate) async fn execute(
    app: &AppContext,
    args: &SshArgs,
    reporter: &dyn ProgressReporter,
) -> Result<(ScenarioReport, Result<()>)> {
    let config = &app.config;
    let skips = args.scenario.skips();
    let policy = args.scenario.policy(config)?;
    let source = args.scenario.terraform_dir(config);
    let (root, module) = split_module(&source)?;
    let work_dir = copy_terraform_folder_to_temp(&root, &module, &skips)?;

    let run_id = generate_run_id();
    let scenario = SshScenario {
        terraform_dir: work_dir.clone(),
        region: args.region.clone().unwrap_or_else(|| config.ssh.region.clone()),
        key_pair_name: key_pair_name(&config.ssh.key_name_prefix, &run_id),
        output_key: config.ssh.output.clone(),
        user: config.ssh.user.clone(),
        expected_text: config.ssh.expected_text.clone(),
        policy,
    };

    let command_timeout = Duration::from_secs(config.terraform.command_timeout_secs);
    let provisioner = terraform(config);
    let credentials = AwsKeyPairs::new(
        TokioCommandRunner::new(command_timeout),
        config.aws.binary.clone(),
        config.ssh.keygen_binary.clone(),
    );
    let shell = SshCli::new(
        TokioCommandRunner::new(command_timeout),
        config.ssh.binary.clone(),
        Duration::from_secs(config.ssh.connect_timeout_secs),
    );
    let store = FileStateStore::new(&work_dir);
    let ports = SshPorts {
        provisioner: &provisioner,
        credentials: &credentials,
        shell: &shell,
        store: &store,
    };

    let mut runner = StageRunner::new(skips.clone(), reporter);
    let result = run_ssh_scenario(&ports, &scenario, &mut runner).await;

    let torn_down = runner.status(Stage::Teardown) == StageStatus::Completed
        && !skips.is_skipped(Stage::Teardown);
    if !skips.any() {
        if torn_down {
            remove_working_copy(&work_dir);
        } else {
            warn!(
                dir = %work_dir.display(),
                "teardown did not finish; working copy and saved state kept"
            );
        }
    }

    let report = ScenarioReport {
        scenario: ScenarioKind::Ssh,
        run_id: Some(run_id),
        stages: runner.records().to_vec(),
        succeeded: result.is_ok(),
    };
    Ok((report, result))
}

/// Remove the temporary directory created by `copy_terraform_folder_to_temp`.
fn remove_working_copy(work_dir: &Path) {
    let Some(temp_root) = work_dir.parent() else {
        return;
    };
    match std::fs::remove_dir_all(temp_root) {
        Ok(()) => debug!(dir = %temp_root.display(), "removed working copy"),
        Err(err) => warn!(dir = %temp_root.display(), error = %err, "could not remove working copy"),
    }
}
