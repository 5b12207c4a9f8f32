//! Fixtures shared by unit tests.

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::{
    github::{GitHubApi, GitHubError, RepoRef},
    webhooks::github::IssueCommentEvent,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Comment {
        repo: String,
        issue: u64,
        body: String,
    },
    RequestReviewers {
        repo: String,
        pull: u64,
        reviewers: Vec<String>,
    },
    RemoveReviewers {
        repo: String,
        pull: u64,
        reviewers: Vec<String>,
    },
}

/// A [`GitHubApi`] that records every call, and can be told to fail some of them.
#[derive(Default)]
pub struct RecordingGitHub {
    calls: Mutex<Vec<ApiCall>>,
    comment_failure: Option<(u16, String)>,
    review_failure: Option<(u16, String)>,
}

impl RecordingGitHub {
    pub fn failing_comments(status: u16, body: &str) -> Self {
        Self {
            comment_failure: Some((status, body.to_owned())),
            ..Default::default()
        }
    }

    pub fn failing_reviews(status: u16, body: &str) -> Self {
        Self {
            review_failure: Some((status, body.to_owned())),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Bodies of the comments posted so far.
    pub fn comments(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Comment { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall, failure: &Option<(u16, String)>) -> Result<(), GitHubError> {
        self.calls.lock().unwrap().push(call);

        match failure {
            Some((status, body)) => Err(GitHubError::Api {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[rocket::async_trait]
impl GitHubApi for RecordingGitHub {
    async fn create_comment(
        &self,
        repo: RepoRef<'_>,
        issue: u64,
        body: &str,
    ) -> Result<(), GitHubError> {
        let call = ApiCall::Comment {
            repo: repo.to_string(),
            issue,
            body: body.to_owned(),
        };
        self.record(call, &self.comment_failure)
    }

    async fn request_reviewers(
        &self,
        repo: RepoRef<'_>,
        pull: u64,
        reviewers: &[String],
    ) -> Result<(), GitHubError> {
        let call = ApiCall::RequestReviewers {
            repo: repo.to_string(),
            pull,
            reviewers: reviewers.to_vec(),
        };
        self.record(call, &self.review_failure)
    }

    async fn remove_requested_reviewers(
        &self,
        repo: RepoRef<'_>,
        pull: u64,
        reviewers: &[String],
    ) -> Result<(), GitHubError> {
        let call = ApiCall::RemoveReviewers {
            repo: repo.to_string(),
            pull,
            reviewers: reviewers.to_vec(),
        };
        self.record(call, &self.review_failure)
    }
}

/// An `issue_comment` payload as GitHub sends it, trimmed to the fields we read (and a few we
/// don't).
pub fn issue_comment_payload(action: &str, body: &str, is_pull_request: bool) -> Value {
    let mut issue = json!({
        "number": 42,
        "html_url": "https://github.com/prologin/site/issues/42",
        "title": "Translate the homepage",
        "state": "open",
    });
    if is_pull_request {
        issue["pull_request"] = json!({
            "url": "https://api.github.com/repos/prologin/site/pulls/42",
            "html_url": "https://github.com/prologin/site/pull/42",
        });
    }

    json!({
        "action": action,
        "issue": issue,
        "comment": {
            "id": 1337,
            "html_url": "https://github.com/prologin/site/issues/42#issuecomment-1337",
            "body": body,
            "user": { "login": "alice", "id": 1 },
        },
        "repository": {
            "name": "site",
            "full_name": "prologin/site",
            "owner": { "login": "prologin", "id": 2 },
            "html_url": "https://github.com/prologin/site",
            "private": false,
        },
        "organization": { "login": "prologin", "id": 2 },
        "sender": { "login": "alice", "id": 1 },
    })
}

pub fn issue_comment_event(body: &str, is_pull_request: bool) -> IssueCommentEvent {
    serde_json::from_value(issue_comment_payload("created", body, is_pull_request))
        .expect("fixture payload should decode")
}
