use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "greenlight")]
#[command(version, about = "Feature delivery orchestrator: failing test to change request")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip interactive confirmations
    #[arg(long, global = true)]
    pub yes: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deliver one feature: red test, implementation loop, review, change request
    Run {
        /// Free-form description or an issue reference like "#12"
        feature_ref: String,

        /// Maximum implementation attempts before giving up
        #[arg(long, default_value = "3")]
        max_iterations: u32,

        /// Feed the previous attempt's file into each retry
        #[arg(long)]
        carry_context: bool,

        /// Override the configured test command
        #[arg(long)]
        test_command: Option<String>,
    },
    /// Scaffold a new project from an idea, with optional remote and issues
    Bootstrap,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Run {
            feature_ref,
            max_iterations,
            carry_context,
            test_command,
        } => {
            cmd::cmd_run(
                &cli,
                project_dir,
                feature_ref,
                *max_iterations,
                *carry_context,
                test_command.as_deref(),
            )
            .await?;
        }
        Commands::Bootstrap => {
            cmd::cmd_bootstrap(&cli, project_dir).await?;
        }
    }

    Ok(())
}
