//! Outbound calls to the GitHub REST API.
//!
//! Commands only see the [`GitHubApi`] trait, so tests can swap the HTTP client for a recording
//! fake.

use std::{fmt::Display, time::Duration};

use reqwest::{header, Client, Method};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("github-command/", env!("CARGO_PKG_VERSION"));
const GITHUB_API_VERSION: &str = "2022-11-28";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Owner login and name of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoRef<'a> {
    pub owner: &'a str,
    pub name: &'a str,
}

impl Display for RepoRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Error)]
pub enum GitHubError {
    /// GitHub answered, but not with a 2xx.
    #[error("GitHub API responded with {status}: {body}")]
    Api { status: u16, body: String },

    #[error("couldn't reach the GitHub API: {0}")]
    Transport(#[from] reqwest::Error),
}

#[rocket::async_trait]
pub trait GitHubApi: Send + Sync {
    /// Posts `body` as a new comment on an issue or pull request.
    async fn create_comment(
        &self,
        repo: RepoRef<'_>,
        issue: u64,
        body: &str,
    ) -> Result<(), GitHubError>;

    async fn request_reviewers(
        &self,
        repo: RepoRef<'_>,
        pull: u64,
        reviewers: &[String],
    ) -> Result<(), GitHubError>;

    async fn remove_requested_reviewers(
        &self,
        repo: RepoRef<'_>,
        pull: u64,
        reviewers: &[String],
    ) -> Result<(), GitHubError>;
}

#[derive(Serialize)]
struct CommentPayload<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct ReviewersPayload<'a> {
    reviewers: &'a [String],
}

/// [`GitHubApi`] over HTTP. Every call is a single request, there are no retries.
pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Builds a client talking to `api_url` (`https://api.github.com` or a GitHub Enterprise
    /// `/api/v3` root). Without a token, requests are sent unauthenticated.
    pub fn new(api_url: &Url, token: Option<String>) -> Result<Self, GitHubError> {
        Self::with_timeout(api_url, token, REQUEST_TIMEOUT)
    }

    /// Calls taking longer than `timeout` end with [`GitHubError::Transport`].
    fn with_timeout(
        api_url: &Url,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.as_str().trim_end_matches('/').to_owned(),
            token,
        })
    }

    async fn send<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
    ) -> Result<(), GitHubError> {
        let url = format!("{}{}", self.api_url, path);
        trace!("sending {} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!("{} answered {}", url, status);
            return Ok(());
        }

        let body = response.text().await?;
        Err(GitHubError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[rocket::async_trait]
impl GitHubApi for GitHubClient {
    async fn create_comment(
        &self,
        repo: RepoRef<'_>,
        issue: u64,
        body: &str,
    ) -> Result<(), GitHubError> {
        let path = format!("/repos/{}/issues/{}/comments", repo, issue);
        self.send(Method::POST, &path, &CommentPayload { body }).await
    }

    async fn request_reviewers(
        &self,
        repo: RepoRef<'_>,
        pull: u64,
        reviewers: &[String],
    ) -> Result<(), GitHubError> {
        let path = format!("/repos/{}/pulls/{}/requested_reviewers", repo, pull);
        self.send(Method::POST, &path, &ReviewersPayload { reviewers })
            .await
    }

    async fn remove_requested_reviewers(
        &self,
        repo: RepoRef<'_>,
        pull: u64,
        reviewers: &[String],
    ) -> Result<(), GitHubError> {
        let path = format!("/repos/{}/pulls/{}/requested_reviewers", repo, pull);
        self.send(Method::DELETE, &path, &ReviewersPayload { reviewers })
            .await
    }
}
