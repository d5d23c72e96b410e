//! Issue/repo host adapter — GitHub over its REST API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const GITHUB_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "greenlight";

/// An issue as the pipeline sees it (subset of host fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostIssue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
}

/// A hosted repository (subset of fields we care about).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRepo {
    pub full_name: String,
    pub name: String,
    pub private: bool,
    pub html_url: String,
    pub clone_url: String,
    pub default_branch: String,
}

/// An opened change request (pull request).
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRequest {
    pub number: u64,
    pub html_url: String,
}

/// The hosted-repository collaborator.
///
/// The pipeline only talks to this trait; the GitHub client below is one
/// implementation, fakes in tests are another.
#[async_trait]
pub trait RepoHost: Send + Sync {
    async fn get_issue(&self, number: u64) -> Result<HostIssue>;
    async fn set_issue_labels(&self, number: u64, labels: &[String]) -> Result<()>;
    async fn default_branch(&self) -> Result<String>;
    async fn create_change_request(
        &self,
        branch: &str,
        title: &str,
        body: &str,
    ) -> Result<ChangeRequest>;
    /// Get the repository, creating it for the authenticated user if absent.
    async fn ensure_repository(&self, name: &str, private: bool) -> Result<HostRepo>;
    async fn create_issue(&self, title: &str, body: &str) -> Result<HostIssue>;
}

/// GitHub REST implementation of [`RepoHost`].
pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
    /// `owner/name` slug of the target repository.
    repo_slug: String,
}

#[derive(Serialize)]
struct CreatePullRequest<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    private: bool,
}

#[derive(Serialize)]
struct SetLabelsRequest<'a> {
    labels: &'a [String],
}

impl GitHubClient {
    pub fn new(token: String, repo_slug: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            repo_slug,
        }
    }

    fn repo_url(&self, tail: &str) -> String {
        format!("{GITHUB_API_BASE}/repos/{}{tail}", self.repo_slug)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
    }

    fn owner(&self) -> &str {
        self.repo_slug.split('/').next().unwrap_or(&self.repo_slug)
    }
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn get_issue(&self, number: u64) -> Result<HostIssue> {
        let url = self.repo_url(&format!("/issues/{number}"));
        self.request(self.client.get(&url))
            .send()
            .await
            .context("Failed to send issue request to GitHub")?
            .error_for_status()
            .context("GitHub issue API returned error status")?
            .json::<HostIssue>()
            .await
            .context("Failed to parse issue response from GitHub")
    }

    async fn set_issue_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        let url = self.repo_url(&format!("/issues/{number}/labels"));
        self.request(self.client.put(&url))
            .json(&SetLabelsRequest { labels })
            .send()
            .await
            .context("Failed to send label update to GitHub")?
            .error_for_status()
            .context("GitHub label API returned error status")?;
        Ok(())
    }

    async fn default_branch(&self) -> Result<String> {
        let url = self.repo_url("");
        let repo: HostRepo = self
            .request(self.client.get(&url))
            .send()
            .await
            .context("Failed to send repository request to GitHub")?
            .error_for_status()
            .context("GitHub repository API returned error status")?
            .json()
            .await
            .context("Failed to parse repository response from GitHub")?;
        Ok(repo.default_branch)
    }

    async fn create_change_request(
        &self,
        branch: &str,
        title: &str,
        body: &str,
    ) -> Result<ChangeRequest> {
        let base = self.default_branch().await?;
        let url = self.repo_url("/pulls");
        self.request(self.client.post(&url))
            .json(&CreatePullRequest {
                title,
                body,
                head: branch,
                base: &base,
            })
            .send()
            .await
            .context("Failed to send pull request to GitHub")?
            .error_for_status()
            .context("GitHub pull request API returned error status")?
            .json::<ChangeRequest>()
            .await
            .context("Failed to parse pull request response from GitHub")
    }

    async fn ensure_repository(&self, name: &str, private: bool) -> Result<HostRepo> {
        let url = format!("{GITHUB_API_BASE}/repos/{}/{name}", self.owner());
        let resp = self
            .request(self.client.get(&url))
            .send()
            .await
            .context("Failed to send repository request to GitHub")?;

        if resp.status() != reqwest::StatusCode::NOT_FOUND {
            return resp
                .error_for_status()
                .context("GitHub repository API returned error status")?
                .json::<HostRepo>()
                .await
                .context("Failed to parse repository response from GitHub");
        }

        // 404: create for the authenticated user
        let create_url = format!("{GITHUB_API_BASE}/user/repos");
        self.request(self.client.post(&create_url))
            .json(&CreateRepoRequest { name, private })
            .send()
            .await
            .context("Failed to send repository creation request to GitHub")?
            .error_for_status()
            .context("GitHub repository creation returned error status")?
            .json::<HostRepo>()
            .await
            .context("Failed to parse created repository response from GitHub")
    }

    async fn create_issue(&self, title: &str, body: &str) -> Result<HostIssue> {
        let url = self.repo_url("/issues");
        self.request(self.client.post(&url))
            .json(&CreateIssueRequest { title, body })
            .send()
            .await
            .context("Failed to send issue creation request to GitHub")?
            .error_for_status()
            .context("GitHub issue creation returned error status")?
            .json::<HostIssue>()
            .await
            .context("Failed to parse created issue response from GitHub")
    }
}
