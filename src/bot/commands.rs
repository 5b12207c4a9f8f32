use std::{collections::HashMap, sync::Arc};

use anyhow::bail;
use thiserror::Error;

use crate::{
    github::{GitHubApi, GitHubError},
    webhooks::github::IssueCommentEvent,
};

mod help;
pub use help::Help;

mod reviewers;
pub use reviewers::{RequestReviewers, UnrequestReviewers};

/// Why a command couldn't be carried out. The message ends up in a reply comment.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command was used somewhere it makes no sense, e.g. asking for reviews on an issue.
    #[error("{0}")]
    InvalidContext(String),

    #[error("{0}")]
    InvalidArguments(String),

    #[error(transparent)]
    GitHub(#[from] GitHubError),
}

/// A slash command. Implementations are built once at startup and hold no per-request state.
#[rocket::async_trait]
pub trait Command: Send + Sync {
    /// What follows the `/` in a comment.
    fn name(&self) -> &'static str;

    /// One line shown in the help message.
    fn description(&self) -> &'static str;

    async fn handle(&self, event: &IssueCommentEvent, args: &str) -> Result<(), CommandError>;
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, Arc<dyn Command>>,
    fallback: Arc<dyn Command>,
}

impl CommandRegistry {
    /// Creates an empty registry. `fallback` answers every name nothing else is registered for.
    pub fn new(fallback: Arc<dyn Command>) -> Self {
        Self {
            commands: HashMap::new(),
            fallback,
        }
    }

    /// The commands this service answers to: `request`, `unrequest`, and `help`, which is also
    /// the fallback.
    pub fn standard(github: Arc<dyn GitHubApi>) -> anyhow::Result<Self> {
        let request = Arc::new(RequestReviewers::new(github.clone()));
        let unrequest = Arc::new(UnrequestReviewers::new(github.clone()));

        let listed: [&dyn Command; 2] = [request.as_ref(), unrequest.as_ref()];
        let help = Arc::new(Help::new(github, &listed));

        let mut registry = Self::new(help.clone());
        registry.register(request)?;
        registry.register(unrequest)?;
        registry.register(help)?;

        Ok(registry)
    }

    pub fn register(&mut self, command: Arc<dyn Command>) -> anyhow::Result<()> {
        let name = command.name();
        if self.commands.contains_key(name) {
            bail!("command /{} is already registered", name);
        }

        self.commands.insert(name, command);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Never fails: unknown names get the fallback, so that they still get an answer.
    pub fn resolve(&self, name: &str) -> &dyn Command {
        self.commands
            .get(name)
            .unwrap_or(&self.fallback)
            .as_ref()
    }
}
