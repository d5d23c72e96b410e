//! The generation service collaborator: typed requests in, typed content out.
//!
//! Every capability returns either structured content or a
//! [`GenerationError`]; no raw service text crosses this boundary.

pub mod decode;
pub mod gemini;

use crate::errors::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The uniform shape of every generated file: a workspace-relative path and
/// UTF-8 content. Produced by the service, persisted immediately, and owned
/// by version control thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationArtifact {
    pub relative_path: String,
    pub content: String,
}

/// Structured result of the review capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewReport {
    pub checklist: Vec<String>,
    #[serde(default)]
    pub suggested_fixes: String,
}

impl ReviewReport {
    /// Fallback used when the service's review output cannot be decoded:
    /// the raw text becomes a single checklist entry. Review is advisory,
    /// so this never fails the run.
    pub fn fallback(raw: &str) -> Self {
        Self {
            checklist: vec![raw.trim().to_string()],
            suggested_fixes: String::new(),
        }
    }

    /// Render the report as a markdown document for the review artifact.
    pub fn to_markdown(&self, feature_title: &str) -> String {
        let mut doc = format!("## Review for {feature_title}\n\n### Checklist\n\n");
        for item in &self.checklist {
            doc.push_str(&format!("- {item}\n"));
        }
        if !self.suggested_fixes.trim().is_empty() {
            doc.push_str(&format!("\n### Suggested fixes\n\n{}\n", self.suggested_fixes));
        }
        doc
    }
}

/// A planning ticket (supplemental: used by project bootstrap).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTicket {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPhase {
    pub name: String,
    #[serde(default)]
    pub tickets: Vec<PlanTicket>,
}

/// A structured product plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPlan {
    #[serde(default)]
    pub stack: String,
    #[serde(default)]
    pub phases: Vec<PlanPhase>,
}

impl ProductPlan {
    /// Fallback plan when the service's output cannot be decoded: one phase,
    /// one ticket carrying the original idea.
    pub fn fallback(idea: &str, stack_hints: &str) -> Self {
        Self {
            stack: if stack_hints.trim().is_empty() {
                "JavaScript/Node.js".into()
            } else {
                stack_hints.to_string()
            },
            phases: vec![PlanPhase {
                name: "Development Phase".into(),
                tickets: vec![PlanTicket {
                    title: idea.to_string(),
                    description: "Implement the core functionality".into(),
                }],
            }],
        }
    }
}

/// High-level architecture sketch for a feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureSketch {
    pub file_structure: Vec<String>,
    #[serde(default)]
    pub system_diagram: String,
    #[serde(default)]
    pub technical_summary: String,
}

impl ArchitectureSketch {
    /// Render the sketch as a markdown document.
    pub fn to_markdown(&self) -> String {
        let mut doc = String::from("# Architecture\n\n## File structure\n\n");
        for entry in &self.file_structure {
            doc.push_str(&format!("- `{entry}`\n"));
        }
        if !self.system_diagram.trim().is_empty() {
            doc.push_str(&format!(
                "\n## System diagram\n\n```mermaid\n{}\n```\n",
                self.system_diagram.trim()
            ));
        }
        if !self.technical_summary.trim().is_empty() {
            doc.push_str(&format!("\n## Summary\n\n{}\n", self.technical_summary));
        }
        doc
    }
}

/// The generation service collaborator. Stateless request/response; each
/// capability may fail with a transport or malformed-response error.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Produce a structured product plan from an idea (bootstrap only).
    async fn plan(&self, idea: &str, stack_hints: &str) -> Result<ProductPlan, GenerationError>;

    /// Sketch an architecture for a feature description.
    async fn architecture(&self, feature: &str) -> Result<ArchitectureSketch, GenerationError>;

    /// Produce a single failing test file for the feature.
    async fn write_failing_test(&self, feature: &str)
    -> Result<GenerationArtifact, GenerationError>;

    /// Produce the minimal implementation for the failing test.
    async fn implement(
        &self,
        test_content: &str,
        existing_files: &str,
    ) -> Result<GenerationArtifact, GenerationError>;

    /// Review code and tests, returning a checklist plus suggested fixes.
    async fn review(&self, code: &str, tests: &str) -> Result<ReviewReport, GenerationError>;
}
