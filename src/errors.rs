//! Typed error hierarchy for the greenlight pipeline.
//!
//! Two top-level enums cover the two failure domains:
//! - `GenerationError` — the generation service boundary (transport vs.
//!   undecodable response)
//! - `DeliveryError` — everything that can abort a delivery run
//!
//! A failing test run is deliberately absent from both: it is the expected
//! case that drives the retry loop, not an error.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the generation service boundary.
///
/// Transport failures and malformed responses are distinct variants so
/// callers can tell "the service was unreachable" apart from "the service
/// answered something we could not decode".
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation service unreachable: {0}")]
    Transport(String),

    #[error("Malformed generation response ({detail}): {preview}")]
    MalformedResponse { detail: String, preview: String },
}

impl GenerationError {
    /// Build a `MalformedResponse` carrying a truncated preview of the raw
    /// text, with control characters stripped so it is safe to log.
    pub fn malformed(detail: impl Into<String>, raw: &str) -> Self {
        let preview: String = raw
            .chars()
            .filter(|c| !c.is_control())
            .take(200)
            .collect();
        Self::MalformedResponse {
            detail: detail.into(),
            preview,
        }
    }
}

/// Errors that abort a delivery run.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Feature reference is empty")]
    EmptyDescription,

    #[error("Invalid feature reference {reference:?}: {reason}")]
    InvalidFeatureRef { reference: String, reason: String },

    #[error("Failed to resolve issue #{issue}: {source}")]
    Resolution {
        issue: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Failed to persist artifact at {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Version control operation failed: {0}")]
    Vcs(#[source] anyhow::Error),

    #[error("Test runner failed to execute: {0}")]
    TestRunner(#[source] anyhow::Error),

    #[error("Failed to publish change request: {0}")]
    Publish(#[source] anyhow::Error),
}
