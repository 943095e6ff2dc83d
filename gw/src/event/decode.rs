//! Envelope decoding
//!
//! Classifies a raw envelope by its `type` discriminator and resolves the
//! nested payload. Unrecognized types, and recognized types without a decode
//! target, become [`EventPayload::Unknown`] and their payload is never parsed.
//! A malformed payload of a known type fails that one envelope only.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::kind::EventKind;
use super::types::{Envelope, Event, EventPayload};

/// Failure to decode a single envelope
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed envelope {}: {source}", .id.as_deref().unwrap_or("<no id>"))]
    Envelope {
        id: Option<String>,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed {raw_type} payload in event {id}: {source}")]
    Payload {
        id: String,
        raw_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read the `id` field of a raw envelope without decoding anything else
///
/// The poller uses this for cursor boundaries so an envelope that fails to
/// decode still counts as seen.
pub fn envelope_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

/// Decode one raw envelope into an [`Event`]
pub fn decode_envelope(value: Value) -> Result<Event, DecodeError> {
    let id = envelope_id(&value).map(str::to_string);
    let envelope: Envelope = serde_json::from_value(value).map_err(|source| DecodeError::Envelope { id, source })?;

    let payload = match EventKind::from_discriminator(&envelope.raw_type) {
        Some(kind) if kind.has_payload_target() => {
            decode_payload(kind, envelope.payload).map_err(|source| DecodeError::Payload {
                id: envelope.id.clone(),
                raw_type: envelope.raw_type.clone(),
                source,
            })?
        }
        _ => {
            debug!(id = %envelope.id, raw_type = %envelope.raw_type, "decode_envelope: no payload target");
            EventPayload::Unknown {
                raw_type: envelope.raw_type.clone(),
            }
        }
    };

    Ok(Event {
        id: envelope.id,
        actor: envelope.actor,
        raw_type: envelope.raw_type,
        repo_name: envelope.repo.name,
        org_name: envelope.org.map(|o| o.login),
        created_at: envelope.created_at,
        payload,
    })
}

/// Decode the payload for a kind that has a decode target
///
/// Kinds without a target map to `Unknown` here as well, so the match stays
/// exhaustive over [`EventKind`].
pub fn decode_payload(kind: EventKind, payload: Value) -> Result<EventPayload, serde_json::Error> {
    let decoded = match kind {
        EventKind::CommitComment => EventPayload::CommitComment(parse(payload)?),
        EventKind::Create => EventPayload::Create(parse(payload)?),
        EventKind::Delete => EventPayload::Delete(parse(payload)?),
        EventKind::Fork => EventPayload::Fork(parse(payload)?),
        EventKind::Gollum => EventPayload::Gollum(parse(payload)?),
        EventKind::IssueComment => EventPayload::IssueComment(parse(payload)?),
        EventKind::Issues => EventPayload::Issues(parse(payload)?),
        EventKind::Member => EventPayload::Member(parse(payload)?),
        EventKind::Public => EventPayload::Public(parse(payload)?),
        EventKind::PullRequest => EventPayload::PullRequest(parse(payload)?),
        EventKind::PullRequestReviewComment => EventPayload::PullRequestReviewComment(parse(payload)?),
        EventKind::Push => EventPayload::Push(parse(payload)?),
        EventKind::Release => EventPayload::Release(parse(payload)?),
        EventKind::Watch => EventPayload::Watch(parse(payload)?),
        EventKind::Deployment
        | EventKind::DeploymentStatus
        | EventKind::Download
        | EventKind::Follow
        | EventKind::ForkApply
        | EventKind::Gist
        | EventKind::Membership
        | EventKind::PageBuild
        | EventKind::Repository
        | EventKind::Status
        | EventKind::TeamAdd => EventPayload::Unknown {
            raw_type: kind.as_str().to_string(),
        },
    };
    Ok(decoded)
}

fn parse<T: DeserializeOwned>(payload: Value) -> Result<T, serde_json::Error> {
    // An absent payload decodes like an empty object
    let payload = if payload.is_null() {
        Value::Object(Default::default())
    } else {
        payload
    };
    serde_json::from_value(payload)
}

/// Decode a page of envelopes, dropping (and logging) the ones that fail
pub fn decode_batch(values: Vec<Value>) -> Vec<Event> {
    debug!(count = values.len(), "decode_batch: called");
    let mut events = Vec::with_capacity(values.len());
    for value in values {
        match decode_envelope(value) {
            Ok(event) => events.push(event),
            Err(e) => warn!(error = %e, "decode_batch: dropping event"),
        }
    }
    events
}
