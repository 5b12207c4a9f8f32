use std::{fmt::Display, sync::Arc};

use tokio::{
    sync::mpsc::UnboundedReceiver,
    task::{JoinError, JoinSet},
};
use tracing::{debug, error, info, warn};

use crate::{
    github::GitHubApi,
    webhooks::{github::IssueCommentEvent, Event},
};

pub(crate) mod commands;
use commands::CommandRegistry;

mod message_builder;

pub(crate) mod parser;
use parser::parse_command;

pub(crate) mod utils;
use utils::shorten_content;

pub struct CommandBot {
    github: Arc<dyn GitHubApi>,
    registry: CommandRegistry,
}

impl CommandBot {
    /// Creates a new [`CommandBot`]. `github` is only used to post error replies, commands carry
    /// their own handle to it.
    pub fn new(github: Arc<dyn GitHubApi>, registry: CommandRegistry) -> Self {
        Self { github, registry }
    }

    /// Handles the events accepted by the webhook endpoint until every sender is dropped, then
    /// waits for the ones still in flight.
    ///
    /// Each event runs in its own task: a slow GitHub call only holds up its own command.
    pub async fn run(self: Arc<Self>, mut events: UnboundedReceiver<Event>) {
        debug!("running...");
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let bot = self.clone();
                        tasks.spawn(async move { bot.handle_event(event).await });
                    }
                    None => {
                        info!("all channel senders were dropped, exiting receive loop");
                        break;
                    }
                },
                Some(result) = tasks.join_next(), if !tasks.is_empty() => log_task_result(result),
            }
        }

        while let Some(result) = tasks.join_next().await {
            log_task_result(result);
        }
    }

    pub async fn handle_event(&self, event: Event) {
        match event {
            Event::IssueComment(event) => self.handle_issue_comment(&event).await,
        }
    }

    /// Runs the command `event` carries. Failures never escape: they are answered with a
    /// comment on the issue.
    async fn handle_issue_comment(&self, event: &IssueCommentEvent) {
        let body = &event.comment.body;

        let parsed = match parse_command(body) {
            Some(parsed) => parsed,
            None => {
                debug!("no command in comment {}", event.comment.html_url);
                let reason = format!(
                    "no commands matched the request: {}",
                    shorten_content(body)
                );
                self.reply_error(event, &reason).await;
                return;
            }
        };

        let command = self.registry.resolve(parsed.name);
        if self.registry.is_registered(parsed.name) {
            info!(
                "handling /{} command from {} on {}: {}",
                command.name(),
                event.sender.login,
                event.repository.full_name,
                event.issue.html_url
            );
        } else {
            info!(
                "/{} command isn't available for: {}, falling back to /{}",
                parsed.name,
                event.issue.html_url,
                command.name()
            );
        }

        if let Err(e) = command.handle(event, parsed.args).await {
            // not a failed delivery: the commenter gets told what went wrong instead
            warn!(
                "/{} failed on {}: {}",
                command.name(),
                event.issue,
                e
            );
            self.reply_error(event, &e).await;
        }
    }

    /// Tells the commenter something went wrong.
    ///
    /// Best effort: if the reply can't be posted either, it is logged and dropped.
    async fn reply_error(&self, event: &IssueCommentEvent, reason: &(dyn Display + Sync)) {
        let reply = format!("Whoops! Error encountered: {}", reason);

        if let Err(e) = self
            .github
            .create_comment(event.repo(), event.issue.number, &reply)
            .await
        {
            error!(
                "error replying to commenter on {}: {}",
                event.issue.html_url, e
            );
        }
    }
}

fn log_task_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!("command task failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        future,
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    use tokio::{sync::mpsc::unbounded_channel, time};

    use super::*;
    use crate::github::{GitHubError, RepoRef};
    use crate::test_utils::{issue_comment_event, ApiCall, RecordingGitHub};

    fn bot_with(github: Arc<RecordingGitHub>) -> CommandBot {
        let registry = CommandRegistry::standard(github.clone()).unwrap();
        CommandBot::new(github, registry)
    }

    async fn handle(bot: &CommandBot, body: &str, is_pull_request: bool) {
        bot.handle_event(Event::IssueComment(issue_comment_event(
            body,
            is_pull_request,
        )))
        .await;
    }

    #[tokio::test]
    async fn runs_the_matching_command() {
        let github = Arc::new(RecordingGitHub::default());
        let bot = bot_with(github.clone());

        handle(&bot, "/request alice, bob", true).await;

        assert_eq!(
            github.calls(),
            vec![ApiCall::RequestReviewers {
                repo: "prologin/site".to_owned(),
                pull: 42,
                reviewers: vec!["alice".to_owned(), "bob".to_owned()],
            }]
        );
    }

    #[tokio::test]
    async fn command_failures_are_replied_to() {
        let github = Arc::new(RecordingGitHub::default());
        let bot = bot_with(github.clone());

        handle(&bot, "/request alice", false).await;

        let comments = github.comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(
            comments[0],
            "Whoops! Error encountered: requesting reviewers only works on pull requests"
        );
    }

    #[tokio::test]
    async fn unparseable_commands_are_replied_to() {
        let github = Arc::new(RecordingGitHub::default());
        let bot = bot_with(github.clone());

        handle(&bot, "/ request alice", true).await;

        assert_eq!(
            github.comments(),
            vec!["Whoops! Error encountered: no commands matched the request: / request alice"]
        );
    }

    #[tokio::test]
    async fn unknown_commands_get_help() {
        let github = Arc::new(RecordingGitHub::default());
        let bot = bot_with(github.clone());

        handle(&bot, "/frobnicate", false).await;

        let comments = github.comments();
        assert_eq!(comments.len(), 1);
        assert!(comments[0].starts_with("`/frobnicate` isn't a command I know."));
        assert!(comments[0].contains("`/request`"));
        assert!(comments[0].contains("`/unrequest`"));
    }

    #[tokio::test]
    async fn api_errors_are_quoted_in_the_reply() {
        let github = Arc::new(RecordingGitHub::failing_reviews(
            422,
            "Reviews may only be requested from collaborators.",
        ));
        let bot = bot_with(github.clone());

        handle(&bot, "/request mallory", true).await;

        assert_eq!(
            github.comments(),
            vec![
                "Whoops! Error encountered: GitHub API responded with 422: \
                 Reviews may only be requested from collaborators."
            ]
        );
    }

    #[tokio::test]
    async fn failing_replies_are_dropped() {
        let github = Arc::new(RecordingGitHub::failing_comments(500, "oops"));
        let bot = bot_with(github.clone());

        // help fails to post, then so does the error reply; nothing panics or retries
        handle(&bot, "/help", false).await;

        assert_eq!(github.comments().len(), 2);
    }

    #[tokio::test]
    async fn run_drains_the_queue_then_stops() {
        let github = Arc::new(RecordingGitHub::default());
        let bot = Arc::new(bot_with(github.clone()));
        let (sender, receiver) = unbounded_channel();

        for _ in 0..2 {
            sender
                .send(Event::IssueComment(issue_comment_event(
                    "/unrequest alice",
                    true,
                )))
                .unwrap();
        }
        drop(sender);

        bot.run(receiver).await;

        // redelivering a command performs it again
        assert_eq!(github.calls().len(), 2);
    }

    /// Never answers the first reviewer request, behaves like [`RecordingGitHub`] afterwards.
    #[derive(Default)]
    struct HangsOnce {
        inner: RecordingGitHub,
        hung: AtomicBool,
    }

    #[rocket::async_trait]
    impl GitHubApi for HangsOnce {
        async fn create_comment(
            &self,
            repo: RepoRef<'_>,
            issue: u64,
            body: &str,
        ) -> Result<(), GitHubError> {
            self.inner.create_comment(repo, issue, body).await
        }

        async fn request_reviewers(
            &self,
            repo: RepoRef<'_>,
            pull: u64,
            reviewers: &[String],
        ) -> Result<(), GitHubError> {
            if !self.hung.swap(true, Ordering::SeqCst) {
                future::pending::<()>().await;
            }
            self.inner.request_reviewers(repo, pull, reviewers).await
        }

        async fn remove_requested_reviewers(
            &self,
            repo: RepoRef<'_>,
            pull: u64,
            reviewers: &[String],
        ) -> Result<(), GitHubError> {
            self.inner.remove_requested_reviewers(repo, pull, reviewers).await
        }
    }

    #[tokio::test]
    async fn a_hung_command_does_not_hold_up_the_next_one() {
        let github = Arc::new(HangsOnce::default());
        let registry = CommandRegistry::standard(github.clone()).unwrap();
        let bot = Arc::new(CommandBot::new(github.clone(), registry));
        let (sender, receiver) = unbounded_channel();

        sender
            .send(Event::IssueComment(issue_comment_event("/request alice", true)))
            .unwrap();
        sender
            .send(Event::IssueComment(issue_comment_event("/help", true)))
            .unwrap();

        let running = tokio::spawn(bot.run(receiver));

        let handled = time::timeout(Duration::from_secs(5), async {
            while github.inner.comments().is_empty() {
                time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        running.abort();

        assert!(handled.is_ok(), "/help was never handled");
        assert!(github.inner.comments()[0].contains("**Available commands**"));
        assert!(github.hung.load(Ordering::SeqCst));
    }
}
