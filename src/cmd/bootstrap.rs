//! Project bootstrap — `greenlight bootstrap`.

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;
use std::sync::Arc;

use super::super::Cli;

pub async fn cmd_bootstrap(cli: &Cli, project_dir: PathBuf) -> Result<()> {
    use greenlight::bootstrap::{Bootstrapper, prompt_answers};
    use greenlight::config::{DEFAULT_BIG_MODEL, DEFAULT_SMALL_MODEL};
    use greenlight::generation::gemini::GeminiClient;
    use greenlight::host::GitHubClient;
    use greenlight::ui::StepLogger;
    use greenlight::vcs::GitWorkspace;
    use greenlight::workspace::Workspace;

    dotenvy::dotenv().ok();
    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| anyhow!("Missing required environment variables: GEMINI_API_KEY"))?;

    let answers = prompt_answers(cli.yes)?;
    if answers.project_name.is_empty() {
        anyhow::bail!("Project name is empty after sanitizing");
    }

    let target = project_dir.join(&answers.project_name);
    if target.exists() {
        anyhow::bail!("Directory {} already exists", target.display());
    }
    std::fs::create_dir_all(&target)
        .with_context(|| format!("Failed to create {}", target.display()))?;

    let generation = Arc::new(GeminiClient::new(
        api_key,
        std::env::var("BIG_MODEL").unwrap_or_else(|_| DEFAULT_BIG_MODEL.into()),
        std::env::var("SMALL_MODEL").unwrap_or_else(|_| DEFAULT_SMALL_MODEL.into()),
    ));
    let ui = StepLogger::new(cli.verbose);
    let bootstrapper = Bootstrapper::new(generation, ui);

    let workspace = Workspace::new(target.clone());
    let vcs = GitWorkspace::init(&target, std::env::var("GITHUB_TOKEN").ok())?;
    let plan = bootstrapper.scaffold(&workspace, &vcs, &answers).await?;

    if answers.create_remote {
        let token = std::env::var("GITHUB_TOKEN")
            .map_err(|_| anyhow!("Missing required environment variables: GITHUB_TOKEN"))?;
        let owner = std::env::var("GITHUB_OWNER")
            .map_err(|_| anyhow!("Missing required environment variables: GITHUB_OWNER"))?;
        let host = GitHubClient::new(token, format!("{owner}/{}", answers.project_name));
        bootstrapper.publish(&vcs, &host, &answers, &plan).await?;
    }

    println!("Done. cd into ./{} and run your usual setup.", answers.project_name);
    Ok(())
}
