use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BranchViewError, Result};
use crate::models::{Branch, CommitsByBranch};

/// Thin typed client for the backend endpoints the BranchView feature
/// consumes. One request per call, no retries; retry policy belongs to the
/// caller, and the graph pipeline never sees partial responses.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultBranchResponse {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitsGraphResponse {
    commits_by_branch: CommitsByBranch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBranchRequest<'a> {
    name: &'a str,
    from_sha: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MergeRequest<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RevertRequest<'a> {
    branch: &'a str,
    sha: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestRequest<'a> {
    title: &'a str,
    source_branch: &'a str,
    target_branch: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub html_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(operation: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let reason = response.text().await.unwrap_or_default();
        Err(BranchViewError::api(operation, status.as_u16(), reason))
    }

    pub async fn list_branches(&self, repo: &str) -> Result<Vec<Branch>> {
        let response = self
            .http
            .get(self.url(&format!("repos/{}/branches", repo)))
            .send()
            .await?;
        let branches: Vec<Branch> = Self::check("list-branches", response).await?.json().await?;
        debug!(repo, count = branches.len(), "listed branches");
        Ok(branches)
    }

    pub async fn default_branch(&self, repo: &str) -> Result<String> {
        let response = self
            .http
            .get(self.url(&format!("repos/{}/default-branch", repo)))
            .send()
            .await?;
        let body: DefaultBranchResponse =
            Self::check("default-branch", response).await?.json().await?;
        Ok(body.default_branch)
    }

    /// Fetch up to `depth` commits per requested branch, newest first. Depth
    /// may be insufficient to reach true divergence; the pipeline tolerates
    /// that with its timestamp fallback.
    pub async fn commits_graph(
        &self,
        repo: &str,
        branches: &[String],
        depth: u32,
    ) -> Result<CommitsByBranch> {
        let response = self
            .http
            .get(self.url(&format!("repos/{}/commits-graph", repo)))
            .query(&[("branches", branches.join(",")), ("depth", depth.to_string())])
            .send()
            .await?;
        let body: CommitsGraphResponse =
            Self::check("commits-graph", response).await?.json().await?;
        debug!(
            repo,
            branches = body.commits_by_branch.len(),
            "fetched commits graph"
        );
        Ok(body.commits_by_branch)
    }

    pub async fn create_branch(&self, repo: &str, name: &str, from_sha: &str) -> Result<Branch> {
        let response = self
            .http
            .post(self.url(&format!("repos/{}/branches", repo)))
            .json(&CreateBranchRequest { name, from_sha })
            .send()
            .await?;
        Ok(Self::check("create-branch", response).await?.json().await?)
    }

    pub async fn delete_branch(&self, repo: &str, name: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("repos/{}/branches/{}", repo, name)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BranchViewError::BranchNotFound(name.to_string()));
        }
        Self::check("delete-branch", response).await?;
        Ok(())
    }

    pub async fn merge_branch(&self, repo: &str, source: &str, target: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url(&format!("repos/{}/merges", repo)))
            .json(&MergeRequest {
                source_branch: source,
                target_branch: target,
            })
            .send()
            .await?;
        Self::check("merge-branch", response).await?;
        Ok(())
    }

    pub async fn revert_commit(&self, repo: &str, branch: &str, sha: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url(&format!("repos/{}/reverts", repo)))
            .json(&RevertRequest { branch, sha })
            .send()
            .await?;
        Self::check("revert-commit", response).await?;
        Ok(())
    }

    pub async fn create_pull_request(
        &self,
        repo: &str,
        title: &str,
        source: &str,
        target: &str,
    ) -> Result<PullRequest> {
        let response = self
            .http
            .post(self.url(&format!("repos/{}/pull-requests", repo)))
            .json(&PullRequestRequest {
                title,
                source_branch: source,
                target_branch: target,
            })
            .send()
            .await?;
        Ok(Self::check("create-pull-request", response).await?.json().await?)
    }
}
