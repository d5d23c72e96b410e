use anyhow::{Result, anyhow};
use std::path::PathBuf;

/// Runtime configuration for greenlight.
///
/// Values come from the environment (a `.env` file is honored via `dotenvy`)
/// with CLI flags layered on top by the command handlers.
#[derive(Debug, Clone)]
pub struct Config {
    pub workspace_dir: PathBuf,
    /// `owner/name` slug of the hosted repository.
    pub repo_slug: String,
    pub host_token: String,
    pub api_key: String,
    /// Model used for test/implementation generation.
    pub big_model: String,
    /// Model used for review and plan breakdown.
    pub small_model: String,
    /// Command used to run a generated test file, e.g. `npx jest --runInBand`.
    pub test_command: String,
    pub verbose: bool,
}

pub const DEFAULT_BIG_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_SMALL_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEST_COMMAND: &str = "npx jest --runInBand";

impl Config {
    /// Load configuration from the environment.
    ///
    /// Reports every missing required variable in a single error so the user
    /// can fix their `.env` in one pass.
    pub fn from_env(workspace_dir: PathBuf, verbose: bool) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut missing = Vec::new();
        let host_token = require_var("GITHUB_TOKEN", &mut missing);
        let owner = require_var("GITHUB_OWNER", &mut missing);
        let repo = require_var("GITHUB_REPO", &mut missing);
        let api_key = require_var("GEMINI_API_KEY", &mut missing);

        if !missing.is_empty() {
            return Err(anyhow!(
                "Missing required environment variables: {}\n\n\
                 Ensure your .env has:\n\
                 - GEMINI_API_KEY: generation service API key\n\
                 - GITHUB_TOKEN: personal access token with 'repo' scope\n\
                 - GITHUB_OWNER / GITHUB_REPO: target repository",
                missing.join(", ")
            ));
        }

        Ok(Self {
            workspace_dir,
            repo_slug: format!("{owner}/{repo}"),
            host_token,
            api_key,
            big_model: std::env::var("BIG_MODEL").unwrap_or_else(|_| DEFAULT_BIG_MODEL.into()),
            small_model: std::env::var("SMALL_MODEL")
                .unwrap_or_else(|_| DEFAULT_SMALL_MODEL.into()),
            test_command: std::env::var("TEST_COMMAND")
                .unwrap_or_else(|_| DEFAULT_TEST_COMMAND.into()),
            verbose,
        })
    }

    /// Split `test_command` into program and arguments.
    pub fn test_program(&self) -> Result<(String, Vec<String>)> {
        let mut parts = self.test_command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("TEST_COMMAND is empty"))?
            .to_string();
        Ok((program, parts.map(String::from).collect()))
    }
}

fn require_var(name: &str, missing: &mut Vec<String>) -> String {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(name.to_string());
            String::new()
        }
    }
}
