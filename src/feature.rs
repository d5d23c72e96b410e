//! Feature reference resolution and branch naming.
//!
//! The input token is either a free-text feature description or an issue
//! reference of the form `#<digits>`. Issue references are resolved against
//! the repo host before any branch or workspace state is created.

use crate::errors::DeliveryError;
use crate::host::RepoHost;
use regex::Regex;
use std::sync::OnceLock;

/// A resolved feature request. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct FeatureRequest {
    pub raw_reference: String,
    pub title: String,
    pub description: String,
    /// Set when the run was started from an issue reference.
    pub source_issue: Option<u64>,
}

fn issue_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#(\d+)$").expect("static issue-ref pattern is valid"))
}

/// Parse an issue reference token (`#<digits>`), if the input is one.
pub fn parse_issue_ref(reference: &str) -> Option<u64> {
    issue_ref_pattern()
        .captures(reference.trim())
        .and_then(|caps| caps[1].parse().ok())
}

impl FeatureRequest {
    /// Resolve a feature reference token into a request.
    ///
    /// Issue references are fetched from the host; failure there aborts the
    /// run before any branch exists. Free text is used verbatim.
    pub async fn resolve(
        reference: &str,
        host: &dyn RepoHost,
    ) -> Result<Self, DeliveryError> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(DeliveryError::EmptyDescription);
        }

        if let Some(number) = parse_issue_ref(trimmed) {
            let issue = host
                .get_issue(number)
                .await
                .map_err(|source| DeliveryError::Resolution {
                    issue: number,
                    source,
                })?;
            return Ok(Self {
                raw_reference: trimmed.to_string(),
                title: issue.title,
                description: issue.body.unwrap_or_default(),
                source_issue: Some(number),
            });
        }

        Ok(Self {
            raw_reference: trimmed.to_string(),
            title: trimmed.to_string(),
            description: trimmed.to_string(),
            source_issue: None,
        })
    }

    pub fn is_issue_linked(&self) -> bool {
        self.source_issue.is_some()
    }

    /// Derive the branch name for this feature.
    ///
    /// Deterministic: lowercase, non-alphanumeric runs collapsed to single
    /// hyphens, prefixed `feature/` (with `issue-<id>-` for issue-linked
    /// runs). Errors if nothing survives normalization.
    pub fn branch_name(&self) -> Result<String, DeliveryError> {
        let slug = slugify(&self.title);
        if slug.is_empty() {
            return Err(DeliveryError::InvalidFeatureRef {
                reference: self.raw_reference.clone(),
                reason: "no alphanumeric characters to derive a branch name from".into(),
            });
        }
        Ok(match self.source_issue {
            Some(id) => format!("feature/issue-{id}-{slug}"),
            None => format!("feature/{slug}"),
        })
    }
}

/// Lowercase and collapse anything that is not `[a-z0-9]` into single
/// hyphens, trimming leading/trailing hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ChangeRequest, HostIssue, HostRepo};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;

    struct StubHost {
        issue: Option<HostIssue>,
    }

    #[async_trait]
    impl RepoHost for StubHost {
        async fn get_issue(&self, number: u64) -> Result<HostIssue> {
            self.issue
                .clone()
                .ok_or_else(|| anyhow!("issue #{number} not found"))
        }
        async fn set_issue_labels(&self, _number: u64, _labels: &[String]) -> Result<()> {
            Ok(())
        }
        async fn default_branch(&self) -> Result<String> {
            Ok("main".into())
        }
        async fn create_change_request(
            &self,
            _branch: &str,
            _title: &str,
            _body: &str,
        ) -> Result<ChangeRequest> {
            unimplemented!("not used in resolver tests")
        }
        async fn ensure_repository(&self, _name: &str, _private: bool) -> Result<HostRepo> {
            unimplemented!("not used in resolver tests")
        }
        async fn create_issue(&self, _title: &str, _body: &str) -> Result<HostIssue> {
            unimplemented!("not used in resolver tests")
        }
    }

    fn caching_issue() -> HostIssue {
        HostIssue {
            number: 7,
            title: "Add caching".into(),
            body: Some("Cache hot lookups".into()),
        }
    }

    #[test]
    fn parse_issue_ref_accepts_hash_digits() {
        assert_eq!(parse_issue_ref("#7"), Some(7));
        assert_eq!(parse_issue_ref("#123"), Some(123));
        assert_eq!(parse_issue_ref("  #42  "), Some(42));
    }

    #[test]
    fn parse_issue_ref_rejects_non_refs() {
        assert_eq!(parse_issue_ref("Add a /status endpoint"), None);
        assert_eq!(parse_issue_ref("#"), None);
        assert_eq!(parse_issue_ref("#7b"), None);
        assert_eq!(parse_issue_ref("fix #7"), None);
        assert_eq!(parse_issue_ref("7"), None);
    }

    #[test]
    fn slugify_collapses_and_lowercases() {
        assert_eq!(slugify("Add a /status endpoint"), "add-a-status-endpoint");
        assert_eq!(slugify("  Spaces   and---punct!!  "), "spaces-and-punct");
        assert_eq!(slugify("ALLCAPS"), "allcaps");
        assert_eq!(slugify("..."), "");
    }

    #[tokio::test]
    async fn resolve_free_text_is_not_issue_linked() {
        let host = StubHost { issue: None };
        let request = FeatureRequest::resolve("Add a /status endpoint", &host)
            .await
            .unwrap();
        assert!(!request.is_issue_linked());
        assert_eq!(request.title, "Add a /status endpoint");
        assert_eq!(request.branch_name().unwrap(), "feature/add-a-status-endpoint");
    }

    #[tokio::test]
    async fn resolve_issue_ref_populates_from_host() {
        let host = StubHost {
            issue: Some(caching_issue()),
        };
        let request = FeatureRequest::resolve("#7", &host).await.unwrap();
        assert_eq!(request.source_issue, Some(7));
        assert_eq!(request.title, "Add caching");
        assert_eq!(request.description, "Cache hot lookups");
        assert_eq!(request.branch_name().unwrap(), "feature/issue-7-add-caching");
    }

    #[tokio::test]
    async fn resolve_missing_issue_is_resolution_error() {
        let host = StubHost { issue: None };
        let err = FeatureRequest::resolve("#99", &host).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Resolution { issue: 99, .. }));
    }

    #[tokio::test]
    async fn resolve_empty_input_rejected_before_any_side_effect() {
        let host = StubHost { issue: None };
        let err = FeatureRequest::resolve("   ", &host).await.unwrap_err();
        assert!(matches!(err, DeliveryError::EmptyDescription));
    }

    #[tokio::test]
    async fn branch_name_is_idempotent_and_well_formed() {
        let host = StubHost { issue: None };
        let request = FeatureRequest::resolve("Add OAuth2 login!", &host)
            .await
            .unwrap();
        let first = request.branch_name().unwrap();
        let second = request.branch_name().unwrap();
        assert_eq!(first, second);
        let tail = first.strip_prefix("feature/").unwrap();
        assert!(!tail.is_empty());
        assert!(
            tail.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        );
    }

    #[tokio::test]
    async fn branch_name_errors_when_nothing_survives() {
        let host = StubHost { issue: None };
        let request = FeatureRequest::resolve("!!!", &host).await.unwrap();
        assert!(matches!(
            request.branch_name(),
            Err(DeliveryError::InvalidFeatureRef { .. })
        ));
    }
}
