//! tfcheck — end-to-end checks for Terraform-provisioned infrastructure

use clap::Parser;
use tfcheck_cli::cli::Cli;
use tfcheck_cli::commands::ScenarioFailed;
use tfcheck_cli::output::json::format_error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let json = cli.json;
    if let Err(e) = cli.run().await {
        let reported = e.downcast_ref::<ScenarioFailed>().is_some();
        if json && !reported {
            if let Ok(obj) = format_error(&format!("{e:#}"), "COMMAND_FAILED") {
                println!("{obj}");
            }
        }
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
