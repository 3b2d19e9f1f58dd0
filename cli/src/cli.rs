//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;
use crate::infra::config::YamlConfigStore;

/// End-to-end checks for Terraform-provisioned infrastructure
#[derive(Parser)]
#[command(
    name = "tfcheck",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log progress of retries and external commands to stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable colored output (also honoured via the NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Config file (default: ~/.tfcheck/config.yaml)
    #[arg(long, global = true, env = "TFCHECK_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision the stack and poll its HTTP endpoint
    Http(commands::ScenarioArgs),

    /// Provision a host with a fresh key pair and run a command over SSH
    Ssh(commands::ssh::SshArgs),

    /// Run the HTTP and SSH scenarios concurrently
    All(commands::ssh::SshArgs),

    /// Remove state saved by skipped stages
    Clean(commands::clean::CleanArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            config,
            command,
            ..
        } = self;

        if matches!(command, Command::Version) {
            return commands::version::run(json);
        }

        let store = config.map_or_else(YamlConfigStore::default, YamlConfigStore::with_path);
        let flags = AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        };
        let app = AppContext::new(&flags, &store)?;

        match command {
            Command::Http(args) => commands::http::run(&app, &args).await,
            Command::Ssh(args) => commands::ssh::run(&app, &args).await,
            Command::All(args) => commands::all::run(&app, &args).await,
            Command::Clean(args) => commands::clean::run(&app, &args).await,
            Command::Version => commands::version::run(json),
        }
    }
}
