use std::sync::Arc;

use tracing::info;

use crate::{
    bot::{
        commands::{Command, CommandError},
        parser::split_reviewers,
    },
    github::GitHubApi,
    webhooks::github::IssueCommentEvent,
};

/// Checks that `event` happened on a pull request and reads the logins out of `args`.
fn reviewers_for(
    event: &IssueCommentEvent,
    args: &str,
    context_error: &str,
    empty_error: &str,
) -> Result<Vec<String>, CommandError> {
    if !event.issue.is_pull_request() {
        return Err(CommandError::InvalidContext(context_error.to_owned()));
    }

    let reviewers = split_reviewers(args);
    if reviewers.is_empty() {
        return Err(CommandError::InvalidArguments(empty_error.to_owned()));
    }

    Ok(reviewers.into_iter().collect())
}

/// `/request alice, bob`: asks for reviews on the current pull request.
pub struct RequestReviewers {
    github: Arc<dyn GitHubApi>,
}

impl RequestReviewers {
    pub fn new(github: Arc<dyn GitHubApi>) -> Self {
        Self { github }
    }
}

#[rocket::async_trait]
impl Command for RequestReviewers {
    fn name(&self) -> &'static str {
        "request"
    }

    fn description(&self) -> &'static str {
        "request reviews from the listed users (separated by spaces, commas, semicolons or colons)"
    }

    async fn handle(&self, event: &IssueCommentEvent, args: &str) -> Result<(), CommandError> {
        let reviewers = reviewers_for(
            event,
            args,
            "requesting reviewers only works on pull requests",
            "must request at least one reviewer",
        )?;

        info!(
            "requesting reviews from {:?} on {}#{}",
            reviewers,
            event.repo(),
            event.issue.number
        );
        self.github
            .request_reviewers(event.repo(), event.issue.number, &reviewers)
            .await?;

        Ok(())
    }
}

/// `/unrequest alice`: withdraws review requests from the current pull request.
pub struct UnrequestReviewers {
    github: Arc<dyn GitHubApi>,
}

impl UnrequestReviewers {
    pub fn new(github: Arc<dyn GitHubApi>) -> Self {
        Self { github }
    }
}

#[rocket::async_trait]
impl Command for UnrequestReviewers {
    fn name(&self) -> &'static str {
        "unrequest"
    }

    fn description(&self) -> &'static str {
        "withdraw review requests from the listed users"
    }

    async fn handle(&self, event: &IssueCommentEvent, args: &str) -> Result<(), CommandError> {
        let reviewers = reviewers_for(
            event,
            args,
            "removing requested reviewers only works on pull requests",
            "must unrequest at least one reviewer",
        )?;

        info!(
            "removing review requests for {:?} on {}#{}",
            reviewers,
            event.repo(),
            event.issue.number
        );
        self.github
            .remove_requested_reviewers(event.repo(), event.issue.number, &reviewers)
            .await?;

        Ok(())
    }
}
