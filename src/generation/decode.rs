//! Typed decoding of generation service responses.
//!
//! The service answers in one of two shapes:
//! - a delimiter format for file artifacts
//!   (`---FILENAME--- <path> ---CODE--- <code>`)
//! - JSON, usually inside a fenced code block, for structured results
//!
//! Decode failures produce [`GenerationError::MalformedResponse`] — or a
//! documented fallback value where the capability is advisory.

use crate::errors::GenerationError;
use crate::generation::{ArchitectureSketch, GenerationArtifact, ProductPlan, ReviewReport};
use regex::Regex;
use std::sync::OnceLock;

fn fenced_json_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("static fence pattern is valid")
    })
}

/// Decode the delimiter artifact format into a [`GenerationArtifact`].
pub fn decode_artifact(raw: &str) -> Result<GenerationArtifact, GenerationError> {
    let after_filename = raw
        .split("---FILENAME---")
        .nth(1)
        .ok_or_else(|| GenerationError::malformed("missing ---FILENAME--- delimiter", raw))?;
    let (path_part, code_part) = after_filename
        .split_once("---CODE---")
        .ok_or_else(|| GenerationError::malformed("missing ---CODE--- delimiter", raw))?;

    let relative_path = path_part.trim().to_string();
    if relative_path.is_empty() || relative_path.contains('\n') {
        return Err(GenerationError::malformed(
            "delimiter filename is empty or spans lines",
            raw,
        ));
    }

    let content = strip_code_fence(code_part.trim()).to_string();
    if content.is_empty() {
        return Err(GenerationError::malformed("delimiter code block is empty", raw));
    }

    Ok(GenerationArtifact {
        relative_path,
        content,
    })
}

/// The service sometimes wraps the code section in a markdown fence anyway.
fn strip_code_fence(code: &str) -> &str {
    let trimmed = code.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // drop the language tag line, then the closing fence
        let body = rest.split_once('\n').map_or("", |(_, tail)| tail);
        return body.trim_end().trim_end_matches("```").trim_end();
    }
    trimmed
}

/// Extract the outermost JSON object from free text using brace counting.
pub fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0;
    let mut end = start;

    for (i, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    if depth == 0 && end > start {
        Some(text[start..end].to_string())
    } else {
        None
    }
}

/// Pull a JSON payload out of the response: fenced block first, brace scan
/// second, raw text last.
fn json_candidate(raw: &str) -> Option<String> {
    if let Some(caps) = fenced_json_pattern().captures(raw) {
        let inner = caps[1].trim();
        if !inner.is_empty() {
            return Some(inner.to_string());
        }
    }
    extract_json_object(raw).or_else(|| Some(raw.trim().to_string()))
}

fn decode_json<T: serde::de::DeserializeOwned>(raw: &str) -> Option<T> {
    json_candidate(raw).and_then(|payload| serde_json::from_str(&payload).ok())
}

/// Decode a review response; malformed output degrades to the fallback
/// report rather than failing (review is advisory, never gating).
pub fn decode_review(raw: &str) -> ReviewReport {
    decode_json(raw).unwrap_or_else(|| ReviewReport::fallback(raw))
}

/// Decode a plan response; malformed output degrades to a single-ticket
/// fallback plan.
pub fn decode_plan(raw: &str, idea: &str, stack_hints: &str) -> ProductPlan {
    decode_json(raw).unwrap_or_else(|| ProductPlan::fallback(idea, stack_hints))
}

/// Decode an architecture response; malformed output is a hard error.
pub fn decode_architecture(raw: &str) -> Result<ArchitectureSketch, GenerationError> {
    decode_json(raw)
        .ok_or_else(|| GenerationError::malformed("architecture response is not valid JSON", raw))
}
