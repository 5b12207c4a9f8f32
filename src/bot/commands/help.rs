use std::{fmt::Write, iter, sync::Arc};

use tracing::debug;

use crate::{
    bot::{
        commands::{Command, CommandError},
        message_builder::MessageBuilder,
        parser::parse_command,
    },
    github::GitHubApi,
    webhooks::github::IssueCommentEvent,
};

const NAME: &str = "help";
const DESCRIPTION: &str = "show this message";

/// Posts the list of available commands. Also answers unknown commands.
pub struct Help {
    github: Arc<dyn GitHubApi>,
    text: String,
}

impl Help {
    /// `commands` are listed in the help message, in order, followed by `/help` itself.
    pub fn new(github: Arc<dyn GitHubApi>, commands: &[&dyn Command]) -> Self {
        let mut message = MessageBuilder::new();
        message.bold();
        write!(message, "Available commands").unwrap();

        let entries = commands
            .iter()
            .map(|command| (command.name(), command.description()))
            .chain(iter::once((NAME, DESCRIPTION)));
        for (name, description) in entries {
            message.item();
            message.command(name);
            write!(message, ": {}", description).unwrap();
        }

        Self {
            github,
            text: message.build(),
        }
    }
}

#[rocket::async_trait]
impl Command for Help {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    async fn handle(&self, event: &IssueCommentEvent, _args: &str) -> Result<(), CommandError> {
        let mut message = MessageBuilder::new();
        if let Some(unknown) = parse_command(&event.comment.body).filter(|cmd| cmd.name != NAME) {
            debug!("answering unknown command /{} with help", unknown.name);
            message.command(unknown.name);
            write!(message, " isn't a command I know.\n\n").unwrap();
        }
        write!(message, "{}", self.text).unwrap();

        self.github
            .create_comment(event.repo(), event.issue.number, &message.build())
            .await?;

        Ok(())
    }
}
