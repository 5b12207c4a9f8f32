use std::fmt::Display;

use serde::{de::IgnoredAny, Deserialize};
use serde_json::Value;
use url::Url;

use crate::bot::utils::shorten_content;

mod issue_comment;

pub use issue_comment::*;

/// Values of the `X-GitHub-Event` header.
///
/// Only [`GitHubEventType::IssueComment`] triggers commands, the others are acknowledged and
/// dropped. GitHub keeps adding event types, those land in [`GitHubEventType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitHubEventType {
    CheckRun,
    CheckSuite,
    CommitComment,
    Create,
    Delete,
    Fork,
    IssueComment,
    Issues,
    Label,
    Member,
    Membership,
    Organization,
    Ping,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
    Push,
    Release,
    Repository,
    Status,
    WorkflowRun,
    #[serde(other)]
    Other,
}

impl GitHubEventType {
    /// `None` for an empty header, which says nothing about the payload.
    pub fn from_header(value: &str) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        serde_json::from_value(Value::String(value.to_owned())).ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    pub owner: GitHubUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub html_url: Url,
    pub title: String,
    // an issue can be a PR, in this case the object contains a `pull_request` key with urls to the
    // PR
    pub pull_request: Option<IgnoredAny>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} ({})", self.number, shorten_content(&self.title))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub html_url: Url,
    pub body: String,
    pub user: GitHubUser,
}
