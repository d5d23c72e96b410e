//! Test runner adapter: one test file in, pass/fail out.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// The test runner collaborator. A failing run is `Ok(false)`, never an
/// error; only "could not execute the runner at all" is an error.
#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn run(&self, test_path: &Path) -> Result<bool>;
}

/// Runs the configured test command as a child process and maps its exit
/// status to pass/fail.
pub struct CommandTestRunner {
    program: String,
    args: Vec<String>,
    workdir: PathBuf,
}

impl CommandTestRunner {
    pub fn new(program: String, args: Vec<String>, workdir: PathBuf) -> Self {
        Self {
            program,
            args,
            workdir,
        }
    }
}

#[async_trait]
impl TestRunner for CommandTestRunner {
    async fn run(&self, test_path: &Path) -> Result<bool> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(test_path)
            .current_dir(&self.workdir)
            .status()
            .await
            .with_context(|| {
                format!(
                    "Failed to spawn test command '{}'. Is it on your PATH?",
                    self.program
                )
            })?;

        Ok(status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn passing_command_reports_true() {
        let dir = tempdir().unwrap();
        let runner = CommandTestRunner::new("true".into(), vec![], dir.path().to_path_buf());
        assert!(runner.run(Path::new("ignored.test.js")).await.unwrap());
    }

    #[tokio::test]
    async fn failing_command_reports_false_not_error() {
        let dir = tempdir().unwrap();
        let runner = CommandTestRunner::new("false".into(), vec![], dir.path().to_path_buf());
        assert!(!runner.run(Path::new("ignored.test.js")).await.unwrap());
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let dir = tempdir().unwrap();
        let runner = CommandTestRunner::new(
            "greenlight-no-such-binary".into(),
            vec![],
            dir.path().to_path_buf(),
        );
        let err = runner.run(Path::new("x.test.js")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to spawn"));
    }

    #[tokio::test]
    async fn test_path_is_passed_as_final_arg() {
        let dir = tempdir().unwrap();
        // `test -f <path>` exits zero only when the file exists
        let file = dir.path().join("present.test.js");
        std::fs::write(&file, "x").unwrap();
        let runner = CommandTestRunner::new(
            "test".into(),
            vec!["-f".into()],
            dir.path().to_path_buf(),
        );
        assert!(runner.run(&file).await.unwrap());
        assert!(!runner.run(Path::new("absent.test.js")).await.unwrap());
    }
}
