use rocket::{routes, Build, Rocket};
use tokio::sync::mpsc::UnboundedSender;

pub mod github;
use github::{command_webhook, IssueCommentEvent, WebhookSecret};

pub struct EventSender(pub UnboundedSender<Event>);

/// Work handed from the webhook endpoint to the bot.
#[derive(Debug)]
pub enum Event {
    IssueComment(IssueCommentEvent),
}

/// Mounts the webhook endpoint. Accepted commands are sent through `sender`.
pub fn mount(
    rocket: Rocket<Build>,
    secret: String,
    sender: UnboundedSender<Event>,
) -> Rocket<Build> {
    rocket
        .mount("/", routes![command_webhook])
        .manage(EventSender(sender))
        .manage(WebhookSecret(secret))
}
