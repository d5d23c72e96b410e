//! Feature delivery — `greenlight run <feature-ref>`.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use super::super::Cli;

pub async fn cmd_run(
    cli: &Cli,
    project_dir: PathBuf,
    feature_ref: &str,
    max_iterations: u32,
    carry_context: bool,
    test_command: Option<&str>,
) -> Result<()> {
    use greenlight::config::Config;
    use greenlight::delivery::{DeliveryOutcome, DeliveryPipeline, PipelineOptions, RunJournal};
    use greenlight::generation::gemini::GeminiClient;
    use greenlight::host::GitHubClient;
    use greenlight::runner::CommandTestRunner;
    use greenlight::ui::StepLogger;
    use greenlight::vcs::GitWorkspace;
    use greenlight::workspace::Workspace;

    let mut config = Config::from_env(project_dir.clone(), cli.verbose)?;
    if let Some(command) = test_command {
        config.test_command = command.to_string();
    }

    let (test_program, test_args) = config.test_program()?;

    let generation = Arc::new(GeminiClient::new(
        config.api_key.clone(),
        config.big_model.clone(),
        config.small_model.clone(),
    ));
    let vcs = Arc::new(
        GitWorkspace::open(&project_dir, Some(config.host_token.clone()))
            .context("Failed to open project repository")?,
    );
    let host = Arc::new(GitHubClient::new(
        config.host_token.clone(),
        config.repo_slug.clone(),
    ));
    let tests = Arc::new(CommandTestRunner::new(
        test_program,
        test_args,
        project_dir.clone(),
    ));

    let pipeline = DeliveryPipeline::new(
        generation,
        vcs,
        host,
        tests,
        Workspace::new(config.workspace_dir.clone()),
        RunJournal::new(config.workspace_dir.join(".greenlight").join("run.log")),
        StepLogger::new(cli.verbose),
        PipelineOptions {
            max_iterations,
            carry_context,
        },
    );

    match pipeline.run(feature_ref).await? {
        DeliveryOutcome::Published { change_request_url } => {
            println!("Change request: {change_request_url}");
            Ok(())
        }
        DeliveryOutcome::Exhausted { attempts } => {
            println!("Tests did not pass after {attempts} attempts. Review the branch manually.");
            std::process::exit(1);
        }
    }
}
