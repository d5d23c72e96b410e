//! Cycle state machine and terminal outcomes for a delivery run.

use crate::feature::FeatureRequest;
use crate::generation::GenerationArtifact;

/// States of the implement-retry loop.
///
/// `Red` (test fails) → `Generating` → `Testing` → `Green` or back to `Red`
/// with the attempt counter bumped, until `Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Red,
    Generating,
    Testing,
    Green,
    Exhausted,
}

/// Per-attempt loop state. Lives only for the duration of the retry loop.
#[derive(Debug, Clone)]
pub struct IterationState {
    /// Implementation attempts completed so far (0..=max_iterations).
    pub attempt: u32,
    pub last_artifact: Option<GenerationArtifact>,
    pub tests_passed: bool,
}

impl IterationState {
    pub fn new() -> Self {
        Self {
            attempt: 0,
            last_artifact: None,
            tests_passed: false,
        }
    }

    /// Record one completed attempt: exactly one artifact written, exactly
    /// one test run.
    pub fn record_attempt(&mut self, artifact: GenerationArtifact, passed: bool) {
        self.attempt += 1;
        self.last_artifact = Some(artifact);
        self.tests_passed = passed;
    }

    pub fn state(&self, max_iterations: u32) -> CycleState {
        if self.tests_passed {
            CycleState::Green
        } else if self.attempt >= max_iterations {
            CycleState::Exhausted
        } else {
            CycleState::Red
        }
    }
}

impl Default for IterationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal value of a run. Exhaustion is reported, not thrown: it is a
/// normal (if undesired) outcome requiring human follow-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Published { change_request_url: String },
    Exhausted { attempts: u32 },
}

impl DeliveryOutcome {
    pub fn change_request_url(&self) -> Option<&str> {
        match self {
            Self::Published { change_request_url } => Some(change_request_url),
            Self::Exhausted { .. } => None,
        }
    }
}

/// Commit message for the red step.
pub fn test_commit_message(feature: &FeatureRequest) -> String {
    format!("test: add failing test for {}", sanitize(&feature.title))
}

/// Commit message for one implementation attempt.
pub fn implement_commit_message(
    feature: &FeatureRequest,
    artifact_path: &str,
    attempt: u32,
) -> String {
    format!(
        "feat: implement {} for {} (attempt {})",
        sanitize(artifact_path),
        sanitize(&feature.title),
        attempt
    )
}

/// Commit message for the review artifact.
pub fn review_commit_message(feature: &FeatureRequest) -> String {
    format!("docs: add review for {}", sanitize(&feature.title))
}

/// Strip control characters from feature-derived text before it lands in a
/// commit message.
fn sanitize(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}
