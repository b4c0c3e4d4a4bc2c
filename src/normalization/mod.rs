//! Mapping of GitHub webhook payloads into the six-field event record.
//!
//! Each supported `X-GitHub-Event` tag has a typed payload. Fields are optional at the
//! serde layer so a missing value is reported by its dotted path instead of a serde message.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use utoipa::ToSchema;

use crate::timestamp::format_timestamp;

/// What happened in the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    Push,
    PullRequest,
    Merge,
}

impl EventAction {
    /// Return the canonical string representation for this action.
    pub const fn as_str(self) -> &'static str {
        match self {
            EventAction::Push => "PUSH",
            EventAction::PullRequest => "PULL_REQUEST",
            EventAction::Merge => "MERGE",
        }
    }

    /// Return the action matching the canonical string, if any.
    pub fn parse(value: &str) -> Option<Self> {
        [EventAction::Push, EventAction::PullRequest, EventAction::Merge]
            .into_iter()
            .find(|action| action.as_str() == value)
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Webhook event kinds that produce a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Push,
    PullRequest,
}

impl EventType {
    /// Match an `X-GitHub-Event` tag. Unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "push" => Some(EventType::Push),
            "pull_request" => Some(EventType::PullRequest),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EventType::Push => "push",
            EventType::PullRequest => "pull_request",
        }
    }
}

/// Canonical record persisted for every supported delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NormalizedEvent {
    /// Commit id for pushes, pull request id otherwise
    pub request_id: String,
    pub author: String,
    pub action: EventAction,
    pub from_branch: String,
    pub to_branch: String,
    /// Display form, e.g. `1st April 2021 - 09:30 PM UTC`
    pub timestamp: String,
}

/// Errors raised for a supported event type whose payload cannot be mapped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("{event_type} payload is not valid: {reason}")]
    InvalidPayload {
        event_type: &'static str,
        reason: String,
    },
    #[error("{event_type} payload missing required field: {field}")]
    MissingField {
        event_type: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    pusher: Option<Pusher>,
    head_commit: Option<HeadCommit>,
}

#[derive(Debug, Deserialize)]
struct Pusher {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HeadCommit {
    id: Option<String>,
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    pull_request: Option<PullRequest>,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    id: Option<PullRequestId>,
    user: Option<User>,
    head: Option<BranchRef>,
    base: Option<BranchRef>,
    merged: Option<bool>,
    merged_at: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PullRequestId {
    Number(serde_json::Number),
    Text(String),
}

impl PullRequestId {
    fn into_string(self) -> String {
        match self {
            PullRequestId::Number(id) => id.to_string(),
            PullRequestId::Text(id) => id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct User {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    name: Option<String>,
}

/// Normalize a webhook body according to its event-type tag.
///
/// Returns `Ok(None)` for tags that are not handled (including an empty tag).
pub fn normalize_event(
    event_type: &str,
    payload: &[u8],
) -> Result<Option<NormalizedEvent>, NormalizationError> {
    let Some(kind) = EventType::parse(event_type) else {
        return Ok(None);
    };

    let result = match kind {
        EventType::Push => normalize_push(payload),
        EventType::PullRequest => normalize_pull_request(payload),
    };

    match result {
        Ok(event) => Ok(Some(event)),
        Err(err) => {
            warn!(event_type = kind.as_str(), error = %err, "Failed to normalize webhook payload");
            Err(err)
        }
    }
}

fn normalize_push(payload: &[u8]) -> Result<NormalizedEvent, NormalizationError> {
    const EVENT: &str = "push";

    let payload: PushPayload = parse_payload(EVENT, payload)?;
    let git_ref = required(EVENT, "ref", payload.git_ref)?;
    let author = required(
        EVENT,
        "pusher.name",
        payload.pusher.and_then(|pusher| pusher.name),
    )?;
    let head_commit = required(EVENT, "head_commit", payload.head_commit)?;
    let commit_id = required(EVENT, "head_commit.id", head_commit.id)?;
    let committed_at = required(EVENT, "head_commit.timestamp", head_commit.timestamp)?;

    let branch = branch_name(&git_ref).to_string();

    Ok(NormalizedEvent {
        request_id: commit_id,
        author,
        action: EventAction::Push,
        from_branch: branch.clone(),
        to_branch: branch,
        timestamp: format_timestamp(&committed_at),
    })
}

fn normalize_pull_request(payload: &[u8]) -> Result<NormalizedEvent, NormalizationError> {
    const EVENT: &str = "pull_request";

    let payload: PullRequestPayload = parse_payload(EVENT, payload)?;
    let pr = required(EVENT, "pull_request", payload.pull_request)?;

    let request_id = required(EVENT, "pull_request.id", pr.id)?.into_string();
    let author = required(
        EVENT,
        "pull_request.user.login",
        pr.user.and_then(|user| user.login),
    )?;
    let from_branch = required(
        EVENT,
        "pull_request.head.ref",
        pr.head.and_then(|head| head.name),
    )?;
    let to_branch = required(
        EVENT,
        "pull_request.base.ref",
        pr.base.and_then(|base| base.name),
    )?;

    let (action, raw_timestamp) = if pr.merged.unwrap_or(false) {
        (
            EventAction::Merge,
            required(EVENT, "pull_request.merged_at", pr.merged_at)?,
        )
    } else {
        (
            EventAction::PullRequest,
            required(EVENT, "pull_request.created_at", pr.created_at)?,
        )
    };

    Ok(NormalizedEvent {
        request_id,
        author,
        action,
        from_branch,
        to_branch,
        timestamp: format_timestamp(&raw_timestamp),
    })
}

fn parse_payload<'de, T: Deserialize<'de>>(
    event_type: &'static str,
    payload: &'de [u8],
) -> Result<T, NormalizationError> {
    serde_json::from_slice(payload).map_err(|err| NormalizationError::InvalidPayload {
        event_type,
        reason: err.to_string(),
    })
}

fn required<T>(
    event_type: &'static str,
    field: &'static str,
    value: Option<T>,
) -> Result<T, NormalizationError> {
    value.ok_or(NormalizationError::MissingField { event_type, field })
}

/// Last `/`-separated segment of a git ref (`refs/heads/main` gives `main`).
fn branch_name(git_ref: &str) -> &str {
    git_ref.rsplit('/').next().unwrap_or(git_ref)
}
