use std::convert::Infallible;

use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

mod events;
pub use events::*;

mod signing;
use signing::{RawPayload, SignatureAlgorithm};

use crate::webhooks::{Event, EventSender};

const X_GITHUB_EVENT: &str = "X-GitHub-Event";
const X_GITHUB_DELIVERY: &str = "X-GitHub-Delivery";

pub struct WebhookSecret(pub String);

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("no signature provided in request header")]
    SignatureMissing,

    #[error("signatures did not match")]
    SignatureMismatch,

    #[error("couldn't decode payload: {0}")]
    PayloadDecode(#[from] serde_json::Error),

    #[error("unrecognized payload type: {0}")]
    UnsupportedPayloadType(String),
}

impl WebhookError {
    pub fn status(&self) -> Status {
        match self {
            Self::SignatureMismatch => Status::Forbidden,
            Self::SignatureMissing | Self::PayloadDecode(_) | Self::UnsupportedPayloadType(_) => {
                Status::BadRequest
            }
        }
    }
}

/// The headers GitHub sends along with a delivery. None of them is checked here, a missing
/// signature is only rejected once the body is read.
#[derive(Debug, Default)]
pub struct WebhookHeaders<'r> {
    /// `X-Hub-Signature-256` if present, `X-Hub-Signature` otherwise.
    pub signature: Option<&'r str>,
    pub event_type: Option<&'r str>,
    pub delivery: Option<&'r str>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for WebhookHeaders<'r> {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let headers = request.headers();

        let signature = [SignatureAlgorithm::Sha256, SignatureAlgorithm::Sha1]
            .into_iter()
            .filter_map(|algorithm| headers.get_one(algorithm.header()))
            .find(|signature| !signature.is_empty());

        Outcome::Success(WebhookHeaders {
            signature,
            event_type: headers.get_one(X_GITHUB_EVENT),
            delivery: headers.get_one(X_GITHUB_DELIVERY),
        })
    }
}

/// What to do with an authenticated delivery.
#[derive(Debug)]
pub enum Dispatch {
    /// Nothing to do, the reason is only logged.
    Ignored(&'static str),
    /// A freshly created comment that looks like a command.
    Command(IssueCommentEvent),
}

/// Authenticates and decodes a delivery, and decides whether the bot should look at it.
///
/// GitHub sends a delivery per action on an event, only newly created comments starting with a
/// `/` are passed on.
pub fn dispatch(
    body: &[u8],
    headers: &WebhookHeaders<'_>,
    secret: &str,
) -> Result<Dispatch, WebhookError> {
    let signature = headers
        .signature
        .filter(|signature| !signature.is_empty())
        .ok_or(WebhookError::SignatureMissing)?;

    signing::verify(body, secret, signature).map_err(|_| WebhookError::SignatureMismatch)?;
    trace!("validated GitHub payload");

    let envelope: Map<String, Value> = serde_json::from_slice(body)?;

    let event_type = match headers.event_type.and_then(GitHubEventType::from_header) {
        Some(event_type) => event_type,
        // deliveries always carry the header, but replayed payloads may not
        None if envelope.contains_key("comment") && envelope.contains_key("issue") => {
            GitHubEventType::IssueComment
        }
        None => {
            return Err(WebhookError::UnsupportedPayloadType(
                "missing event type".to_owned(),
            ))
        }
    };

    if event_type != GitHubEventType::IssueComment {
        debug!(
            "ignoring {} event",
            headers.event_type.unwrap_or("<unknown>")
        );
        return Ok(Dispatch::Ignored("handler only responds to issue comments"));
    }

    let event: IssueCommentEvent = serde_json::from_value(Value::Object(envelope))?;

    if event.action != IssueCommentAction::Created {
        debug!("ignoring {:?} comment on {}", event.action, event.issue);
        return Ok(Dispatch::Ignored(
            "handler only responds to creating comments",
        ));
    }

    if !event.comment.body.starts_with('/') {
        return Ok(Dispatch::Ignored("comment did not start with /"));
    }

    Ok(Dispatch::Command(event))
}

#[rocket::post("/v1/command", data = "<payload>")]
pub fn command_webhook(
    headers: WebhookHeaders<'_>,
    payload: RawPayload,
    secret: &State<WebhookSecret>,
    sender: &State<EventSender>,
) -> Status {
    let delivery = headers.delivery.unwrap_or("<unknown>");

    match dispatch(&payload.0, &headers, &secret.0) {
        Ok(Dispatch::Ignored(reason)) => {
            debug!("delivery {}: {}", delivery, reason);
            Status::Ok
        }
        Ok(Dispatch::Command(event)) => {
            info!(
                "delivery {}: queueing command from {} on {}",
                delivery, event.comment.user.login, event.issue.html_url
            );
            match sender.0.send(Event::IssueComment(event)) {
                Ok(()) => Status::Ok,
                Err(_) => {
                    error!("mpsc channel was closed / dropped, can't handle commands");
                    Status::InternalServerError
                }
            }
        }
        Err(e) => {
            warn!("rejecting delivery {}: {}", delivery, e);
            e.status()
        }
    }
}
