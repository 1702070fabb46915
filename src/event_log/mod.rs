//! Event lifecycle ledger.
//!
//! One [`EventRecord`] per external trigger, stored as a whole JSON
//! document at `events/{event_id}.json`. The record carries the lifecycle
//! status, an append-only email-attempt history, and an append-only error
//! history. Only the explicit cleanup operation ever archives a record;
//! nothing is deleted implicitly.

mod manager;
mod types;

pub use manager::EventLogManager;
pub use types::{
    EmailAttempt, ErrorEntry, EventLogError, EventLogResult, EventRecord, EventStatus,
    NotificationStage, TriggerInfo,
};
