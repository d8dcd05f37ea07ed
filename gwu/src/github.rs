//! Pull requests through the GitHub REST API.

use gwu_common::BestEffort;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::commit::{branch_name, pull_request_body, pull_request_title};

const USER_AGENT: &str = concat!("gradle-wrapper-updater/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Repository token contains characters not allowed in a header")]
    InvalidToken,

    #[error("GitHub request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub {endpoint} returned {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, GitHubError>;

/// A branch left behind by an earlier run for the same release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRequest {
    pub reference: String,
    pub sha: String,
    pub url: String,
}

/// Hosting service that receives the change request. Mocked in tests.
pub trait ChangeRequestService {
    /// Look for the working branch of an update to `target_version`.
    fn find_existing_request(
        &self,
        target_version: &str,
    ) -> impl Future<Output = Result<Option<ExistingRequest>>> + Send;

    /// Open a pull request from `branch`, returning its URL.
    fn open_request(
        &self,
        branch: &str,
        target_version: &str,
        source_version: Option<&str>,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Repository coordinates and pull request decorations.
#[derive(Debug, Clone, Default)]
pub struct GitHubSettings {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub token: String,
    pub reviewers: Vec<String>,
    pub team_reviewers: Vec<String>,
    pub labels: Vec<String>,
    /// Target branch; the repository default when `None`.
    pub base_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    #[serde(rename = "ref")]
    reference: String,
    url: String,
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    default_branch: String,
}

#[derive(Debug, Serialize)]
struct NewPullRequest<'a> {
    title: String,
    head: &'a str,
    base: &'a str,
    body: String,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    number: u64,
    html_url: String,
}

#[derive(Debug, Serialize)]
struct ReviewRequest<'a> {
    reviewers: &'a [String],
    team_reviewers: &'a [String],
}

#[derive(Debug, Serialize)]
struct Labels<'a> {
    labels: &'a [String],
}

/// [`ChangeRequestService`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubOps {
    client: Client,
    settings: GitHubSettings,
}

impl GitHubOps {
    pub fn new(settings: GitHubSettings) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.token))
            .map_err(|_| GitHubError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, settings })
    }

    fn repo_url(&self, path: &str) -> String {
        let base = self.settings.api_url.trim_end_matches('/');
        let repo = format!("{base}/repos/{}/{}", self.settings.owner, self.settings.repo);
        if path.is_empty() { repo } else { format!("{repo}/{path}") }
    }

    /// Send `request`, failing on any non-success status.
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(endpoint, status = %status, "GitHub API");
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GitHubError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T> {
        Ok(self.send(endpoint, request).await?.json().await?)
    }

    async fn base_branch(&self) -> Result<String> {
        if let Some(base) = &self.settings.base_branch {
            return Ok(base.clone());
        }
        let repo: Repository = self
            .send_json("repos", self.client.get(self.repo_url("")))
            .await?;
        debug!(branch = %repo.default_branch, "Using default branch as base");
        Ok(repo.default_branch)
    }

    async fn request_reviewers(&self, number: u64) -> BestEffort {
        let (reviewers, teams) = (&self.settings.reviewers, &self.settings.team_reviewers);
        if reviewers.is_empty() && teams.is_empty() {
            return BestEffort::Skipped("no reviewers configured".to_string());
        }
        let body = ReviewRequest {
            reviewers,
            team_reviewers: teams,
        };
        let request = self
            .client
            .post(self.repo_url(&format!("pulls/{number}/requested_reviewers")))
            .json(&body);
        match self.send("requested_reviewers", request).await {
            Ok(_) => BestEffort::Completed,
            Err(e) => BestEffort::Failed(e.to_string()),
        }
    }

    async fn add_labels(&self, number: u64) -> BestEffort {
        if self.settings.labels.is_empty() {
            return BestEffort::Skipped("no labels configured".to_string());
        }
        let request = self
            .client
            .post(self.repo_url(&format!("issues/{number}/labels")))
            .json(&Labels {
                labels: &self.settings.labels,
            });
        match self.send("labels", request).await {
            Ok(_) => BestEffort::Completed,
            Err(e) => BestEffort::Failed(e.to_string()),
        }
    }
}

impl ChangeRequestService for GitHubOps {
    async fn find_existing_request(&self, target_version: &str) -> Result<Option<ExistingRequest>> {
        let branch = branch_name(target_version);
        let reference = format!("refs/heads/{branch}");
        // matching-refs is a prefix search: 6.7 also matches 6.7.1.
        let refs: Vec<GitRef> = self
            .send_json(
                "matching-refs",
                self.client
                    .get(self.repo_url(&format!("git/matching-refs/heads/{branch}"))),
            )
            .await?;
        let existing = refs
            .into_iter()
            .find(|r| r.reference == reference)
            .map(|r| ExistingRequest {
                reference: r.reference,
                sha: r.object.sha,
                url: r.url,
            });
        if let Some(found) = &existing {
            debug!(reference = %found.reference, sha = %found.sha, url = %found.url, "Existing ref");
        }
        Ok(existing)
    }

    async fn open_request(
        &self,
        branch: &str,
        target_version: &str,
        source_version: Option<&str>,
    ) -> Result<String> {
        let base = self.base_branch().await?;
        let body = NewPullRequest {
            title: pull_request_title(target_version, source_version),
            head: branch,
            base: &base,
            body: pull_request_body(target_version, source_version),
        };
        let pull: PullRequest = self
            .send_json("pulls", self.client.post(self.repo_url("pulls")).json(&body))
            .await?;
        info!(number = pull.number, base = %base, "Pull request created");

        self.request_reviewers(pull.number).await.log("request reviewers");
        self.add_labels(pull.number).await.log("add labels");
        Ok(pull.html_url)
    }
}
