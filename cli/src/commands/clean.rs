//! `tfcheck clean` — remove stage state left behind by skipped stages.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::StateStore;
use crate::infra::state::FileStateStore;

/// Arguments for `tfcheck clean`.
#[derive(Args, Debug, Clone, Default)]
pub struct CleanArgs {
    /// Terraform folder holding the state [default: terraform.dir from config]
    #[arg(long, env = "TFCHECK_TERRAFORM_DIR", value_name = "DIR")]
    pub terraform_dir: Option<PathBuf>,
}

/// Run `tfcheck clean`. Infrastructure is not touched; run the teardown
/// stage for that.
///
/// # Errors
///
/// Returns an error if the prompt or the removal fails.
pub async fn run(app: &AppContext, args: &CleanArgs) -> Result<()> {
    let dir = args
        .terraform_dir
        .clone()
        .unwrap_or_else(|| app.config.terraform.dir.clone());
    let store = FileStateStore::new(&dir);
    let state_dir = store.dir().to_path_buf();

    if !state_dir.exists() {
        print_result(app, &state_dir, false)?;
        if !app.is_json() {
            app.output.info("Nothing to clean.");
        }
        return Ok(());
    }

    let prompt = format!(
        "Remove saved stage state in {}? Resources it describes will no longer be torn down by tfcheck.",
        state_dir.display()
    );
    if !app.non_interactive && !app.confirm(&prompt, false)? {
        app.output.info("Cancelled.");
        return Ok(());
    }

    store.clean().await?;
    print_result(app, &state_dir, true)?;
    if !app.is_json() {
        app.output.success(&format!("Removed {}", state_dir.display()));
    }
    Ok(())
}

fn print_result(app: &AppContext, dir: &std::path::Path, removed: bool) -> Result<()> {
    if app.is_json() {
        let obj = serde_json::json!({
            "removed": removed,
            "path": dir.display().to_string(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&obj).context("JSON serialization failed")?
        );
    }
    Ok(())
}
