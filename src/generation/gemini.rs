//! Gemini-backed implementation of [`GenerationService`].
//!
//! Thin HTTP adapter over the `generateContent` endpoint: build the prompt,
//! send it, pull the first candidate's text out, hand it to `decode`.

use crate::errors::GenerationError;
use crate::generation::decode;
use crate::generation::{
    ArchitectureSketch, GenerationArtifact, GenerationService, ProductPlan, ReviewReport,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    big_model: String,
    small_model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String, big_model: String, small_model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            big_model,
            small_model,
        }
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{API_BASE}/{model}:generateContent");
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("X-Goog-Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        extract_text(body)
    }
}

/// Pull `candidates[0].content.parts[0].text` out of the response body.
fn extract_text(body: GenerateResponse) -> Result<String, GenerationError> {
    body.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| GenerationError::malformed("response has no candidate text", ""))
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn plan(&self, idea: &str, stack_hints: &str) -> Result<ProductPlan, GenerationError> {
        let prompt = prompts::plan(idea, stack_hints);
        let raw = self.generate(&self.small_model, &prompt).await?;
        Ok(decode::decode_plan(&raw, idea, stack_hints))
    }

    async fn architecture(&self, feature: &str) -> Result<ArchitectureSketch, GenerationError> {
        let prompt = prompts::architecture(feature);
        let raw = self.generate(&self.big_model, &prompt).await?;
        decode::decode_architecture(&raw)
    }

    async fn write_failing_test(
        &self,
        feature: &str,
    ) -> Result<GenerationArtifact, GenerationError> {
        let prompt = prompts::failing_test(feature);
        let raw = self.generate(&self.big_model, &prompt).await?;
        decode::decode_artifact(&raw)
    }

    async fn implement(
        &self,
        test_content: &str,
        existing_files: &str,
    ) -> Result<GenerationArtifact, GenerationError> {
        let prompt = prompts::implement(test_content, existing_files);
        let raw = self.generate(&self.big_model, &prompt).await?;
        decode::decode_artifact(&raw)
    }

    async fn review(&self, code: &str, tests: &str) -> Result<ReviewReport, GenerationError> {
        let prompt = prompts::review(code, tests);
        let raw = self.generate(&self.small_model, &prompt).await?;
        Ok(decode::decode_review(&raw))
    }
}

/// Prompt templates for each capability.
pub mod prompts {
    pub fn plan(idea: &str, stack_hints: &str) -> String {
        format!(
            r#"You are a product manager. Given a product idea, generate a structured plan with phases and tickets.

Product Idea: {idea}
Stack Hints: {stack_hints}

Return JSON format:
{{
  "stack": "recommended tech stack",
  "phases": [
    {{
      "name": "Phase 1",
      "tickets": [
        {{"title": "Ticket 1", "description": "..."}},
        {{"title": "Ticket 2", "description": "..."}}
      ]
    }}
  ]
}}
"#
        )
    }

    pub fn architecture(feature: &str) -> String {
        format!(
            r#"You are a staff software architect. Based on the following feature description, design a high-level technical architecture.

Your response must be a JSON object wrapped in a markdown code block with the following keys:
- "file_structure": an array of strings for proposed new files and directories.
- "system_diagram": a MermaidJS graph diagram (graph TD) of components and data flow.
- "technical_summary": a brief explanation of the architectural choices.

Feature Description:
{feature}
"#
        )
    }

    pub fn failing_test(feature: &str) -> String {
        format!(
            r#"You are a professional test writer. Given a feature description, produce a single failing unit test file (filename and code only) that demonstrates the desired behavior and includes descriptive test names.
Feature: {feature}

Output format:
---FILENAME---
<relative path and filename>
---CODE---
<code for the test file>
"#
        )
    }

    pub fn implement(test_content: &str, existing_files: &str) -> String {
        format!(
            r#"You are a concise developer. Given the failing test content below, produce the minimal code (single file) to make the test pass. Return only the filename and code in this format:

---FILENAME---
relative/path/file.js
---CODE---
<code>

Failing test:
{test_content}

Existing files (if any):
{existing_files}
"#
        )
    }

    pub fn review(code: &str, tests: &str) -> String {
        format!(
            r#"You are a senior code reviewer. Given the code and tests below, produce a short checklist (security, edge cases, missing tests, code style) and a short suggested diff or small fixes if appropriate.

=== CODE ===
{code}

=== TESTS ===
{tests}

Output a JSON object with keys: "checklist" (array of strings) and "suggested_fixes" (string)
"#
        )
    }
}
