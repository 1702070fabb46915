//! Event record types and error definitions

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::DeliveryResult;
use crate::store::StoreError;

/// Event-log-specific error type
#[derive(Debug, Error)]
pub enum EventLogError {
    /// Caller referenced an event id that was never recorded
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Cleanup was requested for an event that is still open
    #[error("Event {id} is not resolved (status: {status:?})")]
    NotResolved { id: String, status: EventStatus },

    /// No mutation is accepted once an event is archived
    #[error("Event {0} is already archived")]
    AlreadyArchived(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for event log operations
pub type EventLogResult<T> = Result<T, EventLogError>;

/// Lifecycle status of one external trigger.
///
/// Transitions are monotonic: `Created → AwaitingResponse → Reminded →
/// Escalated`, with `Resolved` reachable from any non-archived state and
/// `Archived` only from `Resolved` via explicit cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Created,
    AwaitingResponse,
    Reminded,
    Escalated,
    Resolved,
    Archived,
}

/// Which notification stage an email attempt belongs to.
///
/// The stage is carried by the template id, not by extra top-level event
/// states: a first and a second reminder both land in `Reminded`, and the
/// attempt entries tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStage {
    Initial,
    Reminder,
    Escalation,
    Other,
}

impl NotificationStage {
    /// Classify a template id by the stage it names
    /// ("initial_request_template", "reminder_template",
    /// "escalation_template").
    pub fn classify(template_id: &str) -> Self {
        let id = template_id.to_ascii_lowercase();
        if id.contains("escalation") {
            Self::Escalation
        } else if id.contains("reminder") {
            Self::Reminder
        } else if id.contains("initial") || id.contains("request") {
            Self::Initial
        } else {
            Self::Other
        }
    }
}

/// What triggered the event and why. First writer wins; later
/// `record_trigger` calls never overwrite this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerInfo {
    /// Source system the trigger came from (e.g. "calendar")
    pub source: String,
    /// Why this trigger needs a notification workflow
    pub reason: String,
    /// Arbitrary key/value context captured at trigger time
    #[serde(default)]
    pub context: HashMap<String, String>,
}

/// One email attempt folded into the event's append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAttempt {
    pub template_id: String,
    pub recipient: String,
    pub stage: NotificationStage,
    pub result: DeliveryResult,
}

/// One error observed while processing this event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub occurred_at: DateTime<Utc>,
    pub step_name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// Durable record of one external trigger's lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    /// Non-decreasing; bumped on every mutation
    pub updated_at: DateTime<Utc>,
    pub trigger: TriggerInfo,
    /// Append-only sequence of email attempts
    #[serde(default)]
    pub email_history: Vec<EmailAttempt>,
    /// Append-only sequence of processing errors
    #[serde(default)]
    pub error_history: Vec<ErrorEntry>,
    /// Set once by the explicit cleanup operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl EventRecord {
    pub(crate) fn new(event_id: &str, trigger: TriggerInfo) -> Self {
        let now = Utc::now();
        Self {
            event_id: event_id.to_string(),
            status: EventStatus::Created,
            created_at: now,
            updated_at: now,
            trigger,
            email_history: Vec::new(),
            error_history: Vec::new(),
            archived_at: None,
        }
    }
}
