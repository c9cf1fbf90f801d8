use std::{fmt, sync::Arc};

use anyhow::Context as _;
use axum::extract::State;
use axum::response::IntoResponse;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use hyper::{HeaderMap, StatusCode};
use sha2::Sha256;
use tracing as log;
use tracing::debug;

use super::IssueCommentEvent;
use crate::handlers;
use crate::interactions::ErrorComment;

/// The name of a webhook event.
#[derive(Debug)]
pub enum EventName {
    /// An issue or PR comment.
    ///
    /// <https://docs.github.com/en/developers/webhooks-and-events/webhooks/webhook-events-and-payloads#issue_comment>
    IssueComment,
    /// All other unhandled webhooks.
    Other,
}

impl std::str::FromStr for EventName {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<EventName, Self::Err> {
        Ok(match s {
            "issue_comment" => EventName::IssueComment,
            _ => EventName::Other,
        })
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EventName::IssueComment => "issue_comment",
                EventName::Other => "other",
            }
        )
    }
}

pub fn deserialize_payload<T: serde::de::DeserializeOwned>(v: &str) -> anyhow::Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(v);
    let res: Result<T, _> = serde_path_to_error::deserialize(&mut deserializer);
    match res {
        Ok(r) => Ok(r),
        Err(e) => Err(anyhow::anyhow!("webhook payload: {v}").context(e)),
    }
}

pub async fn webhook(
    headers: HeaderMap,
    State(ctx): State<Arc<handlers::Context>>,
    body: Bytes,
) -> axum::response::Response {
    // Extract X-GitHub-Event header
    let Some(ev) = headers.get("X-GitHub-Event") else {
        tracing::error!("X-GitHub-Event header must be set");
        return (StatusCode::BAD_REQUEST, "X-GitHub-Event header must be set").into_response();
    };
    let Ok(ev) = ev.to_str() else {
        tracing::error!("X-GitHub-Event header must be UTF-8 encoded");
        return (
            StatusCode::BAD_REQUEST,
            "X-GitHub-Event header must be UTF-8 encoded",
        )
            .into_response();
    };
    let Ok(event) = ev.parse::<EventName>();

    debug!("event={event}");

    // Extract X-Hub-Signature-256 header
    let Some(sig) = headers.get("X-Hub-Signature-256") else {
        tracing::error!("X-Hub-Signature-256 header must be set");
        return (
            StatusCode::BAD_REQUEST,
            "X-Hub-Signature-256 header must be set",
        )
            .into_response();
    };
    let Ok(signature) = sig.to_str() else {
        tracing::error!("X-Hub-Signature-256 header must be UTF-8 encoded");
        return (
            StatusCode::BAD_REQUEST,
            "X-Hub-Signature-256 header must be UTF-8 encoded",
        )
            .into_response();
    };

    debug!("signature={signature}");

    // Check signature on body
    let secret =
        std::env::var("GITHUB_WEBHOOK_SECRET").expect("Missing GITHUB_WEBHOOK_SECRET");
    if let Err(err) = check_payload_signed(&secret, signature, &body) {
        tracing::error!("check_payload_signed: {err}");
        return (StatusCode::FORBIDDEN, "Wrong signature").into_response();
    }

    let Ok(payload) = str::from_utf8(&body) else {
        tracing::error!("payload not utf-8");
        return (StatusCode::BAD_REQUEST, "Payload must be UTF-8").into_response();
    };

    match process_payload(event, payload, &ctx).await {
        Ok(true) => ("processed request",).into_response(),
        Ok(false) => ("ignored request",).into_response(),
        Err(err) => {
            tracing::error!("{err:?}");
            let body = format!("request failed: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
    }
}

async fn process_payload(
    event: EventName,
    payload: &str,
    ctx: &handlers::Context,
) -> anyhow::Result<bool> {
    let event = match event {
        EventName::IssueComment => {
            let payload = deserialize_payload::<IssueCommentEvent>(payload)
                .context("failed to deserialize IssueCommentEvent")?;

            log::info!("handling issue comment {payload:?}");

            payload
        }
        // Other events need not be handled
        EventName::Other => {
            return Ok(false);
        }
    };
    if let Err(err) = handlers::handle(ctx, &event).await {
        log::error!("handling event failed: {err:?}");
        let cmnt = ErrorComment::new(&event, &ctx.config.templates.internal_error);
        if let Err(err) = cmnt.post(&*ctx.github).await {
            log::error!("failed to post error comment: {err:?}");
        }
        return Err(anyhow::anyhow!("handling failed, error logged"));
    }
    Ok(true)
}

#[derive(Debug)]
pub struct SignedPayloadError;

impl fmt::Display for SignedPayloadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "failed to validate payload")
    }
}

impl std::error::Error for SignedPayloadError {}

pub fn check_payload_signed(
    secret: &str,
    signature: &str,
    payload: &[u8],
) -> Result<(), SignedPayloadError> {
    let signature = signature
        .strip_prefix("sha256=")
        .ok_or(SignedPayloadError)?;
    let signature = match hex::decode(signature) {
        Ok(e) => e,
        Err(e) => {
            tracing::trace!("hex decode failed for {signature:?}: {e:?}");
            return Err(SignedPayloadError);
        }
    };

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    mac.verify_slice(&signature).map_err(|_| SignedPayloadError)
}
