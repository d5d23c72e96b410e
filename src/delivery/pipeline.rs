//! The feature delivery pipeline: red → green → review → publish.
//!
//! One run drives one feature through the full cycle against four injected
//! collaborators. Execution is strictly sequential; every persisted artifact
//! is committed before the next generation step runs, so the branch history
//! is a usable checkpoint trail even when a run aborts.

use crate::delivery::journal::RunJournal;
use crate::delivery::state::{
    CycleState, DeliveryOutcome, IterationState, implement_commit_message, review_commit_message,
    test_commit_message,
};
use crate::errors::{DeliveryError, GenerationError};
use crate::feature::FeatureRequest;
use crate::generation::{GenerationArtifact, GenerationService, ReviewReport};
use crate::host::RepoHost;
use crate::runner::TestRunner;
use crate::ui::{StepLogger, sanitize_for_log};
use crate::vcs::VersionControl;
use crate::workspace::Workspace;
use std::path::PathBuf;
use std::sync::Arc;

/// Relative path of the persisted review artifact.
pub const REVIEW_ARTIFACT_PATH: &str = "REVIEW.md";

/// Label applied to the source issue once a change request is open.
pub const READY_FOR_REVIEW_LABEL: &str = "ready-for-review";

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Upper bound on implementation attempts.
    pub max_iterations: u32,
    /// When set, each retry sees the previous attempt's artifact. Off by
    /// default: retries are clean-room.
    pub carry_context: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            carry_context: false,
        }
    }
}

pub struct DeliveryPipeline {
    generation: Arc<dyn GenerationService>,
    vcs: Arc<dyn VersionControl>,
    host: Arc<dyn RepoHost>,
    tests: Arc<dyn TestRunner>,
    workspace: Workspace,
    journal: RunJournal,
    ui: StepLogger,
    options: PipelineOptions,
}

impl DeliveryPipeline {
    pub fn new(
        generation: Arc<dyn GenerationService>,
        vcs: Arc<dyn VersionControl>,
        host: Arc<dyn RepoHost>,
        tests: Arc<dyn TestRunner>,
        workspace: Workspace,
        journal: RunJournal,
        ui: StepLogger,
        options: PipelineOptions,
    ) -> Self {
        Self {
            generation,
            vcs,
            host,
            tests,
            workspace,
            journal,
            ui,
            options,
        }
    }

    /// Drive one feature through the full cycle to a terminal outcome.
    pub async fn run(&self, feature_ref: &str) -> Result<DeliveryOutcome, DeliveryError> {
        // Resolve before any side effect: failures here leave nothing behind.
        let feature = FeatureRequest::resolve(feature_ref, self.host.as_ref()).await?;
        let branch = feature.branch_name()?;
        self.ui
            .step(&format!("Feature: {}", sanitize_for_log(&feature.title)));

        self.start_branch(&branch)?;
        let journal_best_effort = |step: &str, attempt: u32, status: &str| {
            // Journal writes are advisory; never fail the run over one.
            if self.journal.record(step, attempt, status).is_err() {
                self.ui.warn("Could not write run journal entry");
            }
        };
        journal_best_effort("branch", 0, &branch);

        // Red step: generate the failing test, checkpoint it, run it.
        let test_artifact = self.red_step(&feature).await?;
        let test_path = self.workspace.resolve(&test_artifact.relative_path).map_err(
            |source| DeliveryError::Workspace {
                path: PathBuf::from(&test_artifact.relative_path),
                source,
            },
        )?;
        let initially_passed = self
            .tests
            .run(&test_path)
            .await
            .map_err(DeliveryError::TestRunner)?;
        journal_best_effort(
            "red",
            0,
            if initially_passed { "passed" } else { "failed" },
        );

        let mut iteration = IterationState::new();
        if initially_passed {
            // Nothing to implement; proceed straight to review.
            self.ui
                .warn("Test passed immediately; skipping implementation loop");
            iteration.tests_passed = true;
        }

        while iteration.state(self.options.max_iterations) == CycleState::Red {
            let attempt = iteration.attempt + 1;
            self.ui.step(&format!(
                "Implementation attempt {attempt}/{}",
                self.options.max_iterations
            ));

            let existing = self.existing_files_context(&iteration);
            let artifact = self
                .generation
                .implement(&test_artifact.content, &existing)
                .await?;
            self.persist(&artifact)?;
            self.commit(&implement_commit_message(
                &feature,
                &artifact.relative_path,
                attempt,
            ))?;

            let passed = self
                .tests
                .run(&test_path)
                .await
                .map_err(DeliveryError::TestRunner)?;
            journal_best_effort(
                "implement",
                attempt,
                if passed { "passed" } else { "failed" },
            );
            iteration.record_attempt(artifact, passed);
        }

        if iteration.state(self.options.max_iterations) == CycleState::Exhausted {
            self.ui.failure(&format!(
                "Tests did not pass after {} attempts; review manually",
                iteration.attempt
            ));
            journal_best_effort("exhausted", iteration.attempt, "terminal");
            return Ok(DeliveryOutcome::Exhausted {
                attempts: iteration.attempt,
            });
        }

        // Green: review, publish, and (when issue-linked) transition the issue.
        let outcome = self
            .review_and_publish(&feature, &branch, &test_artifact, &iteration)
            .await?;
        journal_best_effort("publish", iteration.attempt, "opened");
        Ok(outcome)
    }

    /// Fetch and create the run's branch. The only step allowed to fail with
    /// no prior side effects, so no rollback logic exists anywhere.
    fn start_branch(&self, branch: &str) -> Result<(), DeliveryError> {
        self.ui.step(&format!("Creating branch {branch}"));
        self.vcs.fetch().map_err(DeliveryError::Vcs)?;
        self.vcs
            .checkout_new_branch(branch)
            .map_err(DeliveryError::Vcs)?;
        Ok(())
    }

    async fn red_step(
        &self,
        feature: &FeatureRequest,
    ) -> Result<GenerationArtifact, DeliveryError> {
        self.ui.step("Generating failing test");
        let context = format!("{}\n\n{}", feature.title, feature.description);
        let artifact = self.generation.write_failing_test(&context).await?;
        self.ui
            .detail(&format!("Wrote {}", sanitize_for_log(&artifact.relative_path)));

        // Committed before the test run so the trail survives an abort
        // right after this point.
        self.persist(&artifact)?;
        self.commit(&test_commit_message(feature))?;
        Ok(artifact)
    }

    fn existing_files_context(&self, iteration: &IterationState) -> String {
        if !self.options.carry_context {
            return String::new();
        }
        iteration
            .last_artifact
            .as_ref()
            .map(|a| format!("// {}\n{}", a.relative_path, a.content))
            .unwrap_or_default()
    }

    async fn review_and_publish(
        &self,
        feature: &FeatureRequest,
        branch: &str,
        test_artifact: &GenerationArtifact,
        iteration: &IterationState,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        self.ui.step("Reviewing code and tests");

        // Read back what is actually committed rather than trusting memory.
        // If no implementation attempt happened the test artifact doubles as
        // the code under review.
        let code = match &iteration.last_artifact {
            Some(artifact) => self
                .workspace
                .read_artifact(&artifact.relative_path)
                .map_err(|source| DeliveryError::Workspace {
                    path: PathBuf::from(&artifact.relative_path),
                    source,
                })?,
            None => test_artifact.content.clone(),
        };
        let tests = self
            .workspace
            .read_artifact(&test_artifact.relative_path)
            .map_err(|source| DeliveryError::Workspace {
                path: PathBuf::from(&test_artifact.relative_path),
                source,
            })?;

        // Review is advisory: an undecodable response becomes a fallback
        // report, only transport failures abort.
        let report = match self.generation.review(&code, &tests).await {
            Ok(report) => report,
            Err(GenerationError::MalformedResponse { preview, .. }) => {
                self.ui.warn("Review output was malformed; keeping raw text");
                ReviewReport::fallback(&preview)
            }
            Err(err @ GenerationError::Transport(_)) => return Err(err.into()),
        };

        let review_doc = report.to_markdown(&feature.title);
        self.persist(&GenerationArtifact {
            relative_path: REVIEW_ARTIFACT_PATH.into(),
            content: review_doc.clone(),
        })?;
        self.commit(&review_commit_message(feature))?;

        self.ui.step("Publishing change request");
        self.vcs.push(branch).map_err(DeliveryError::Publish)?;

        let title = format!("Feature: {}", feature.title);
        let body = change_request_body(feature, &review_doc);
        let change_request = self
            .host
            .create_change_request(branch, &title, &body)
            .await
            .map_err(DeliveryError::Publish)?;

        if let Some(issue) = feature.source_issue {
            self.host
                .set_issue_labels(issue, &[READY_FOR_REVIEW_LABEL.to_string()])
                .await
                .map_err(DeliveryError::Publish)?;
            self.ui
                .detail(&format!("Issue #{issue} marked {READY_FOR_REVIEW_LABEL}"));
        }

        self.ui
            .success(&format!("Change request opened: {}", change_request.html_url));
        Ok(DeliveryOutcome::Published {
            change_request_url: change_request.html_url,
        })
    }

    fn persist(&self, artifact: &GenerationArtifact) -> Result<(), DeliveryError> {
        self.workspace
            .write_artifact(&artifact.relative_path, &artifact.content)
            .map_err(|source| DeliveryError::Workspace {
                path: PathBuf::from(&artifact.relative_path),
                source,
            })?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<(), DeliveryError> {
        self.vcs.commit_all(message).map_err(DeliveryError::Vcs)?;
        Ok(())
    }
}

/// Compose the change request body from feature metadata and the review.
fn change_request_body(feature: &FeatureRequest, review_doc: &str) -> String {
    let mut body = format!(
        "Automated change request for {}.\n\n{review_doc}",
        feature.title
    );
    if let Some(issue) = feature.source_issue {
        body.push_str(&format!("\n\ncloses #{issue}\n"));
    }
    body
}
