//! Event log manager over the durable object store.
//!
//! Every mutation is a full read-modify-write of `events/{event_id}.json`;
//! there is no cross-call cache, so the manager is safe across process
//! restarts. At most one writer per event id is assumed (see crate docs
//! on the lost-update race).

use std::sync::Arc;

use chrono::Utc;

use crate::dispatch::DeliveryResult;
use crate::store::{ObjectStore, StoreError};

use super::types::{
    EmailAttempt, ErrorEntry, EventLogError, EventLogResult, EventRecord, EventStatus,
    NotificationStage, TriggerInfo,
};

/// Characters kept as-is when an event id is embedded in a store key;
/// everything else becomes `_`.
fn sanitize_key_component(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Manages event lifecycle records in the object store.
pub struct EventLogManager {
    store: Arc<dyn ObjectStore>,
}

impl EventLogManager {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    fn key(event_id: &str) -> String {
        format!("events/{}.json", sanitize_key_component(event_id))
    }

    async fn load(&self, event_id: &str) -> EventLogResult<EventRecord> {
        let document = self.store.get(&Self::key(event_id)).await.map_err(|e| {
            match e {
                StoreError::NotFound(_) => EventLogError::UnknownEvent(event_id.to_string()),
                other => EventLogError::Storage(other),
            }
        })?;
        let record = serde_json::from_value(document).map_err(StoreError::from)?;
        Ok(record)
    }

    async fn save(&self, record: &EventRecord) -> EventLogResult<()> {
        let document = serde_json::to_value(record).map_err(StoreError::from)?;
        self.store.put(&Self::key(&record.event_id), document).await?;
        Ok(())
    }

    /// Create the record for a newly observed trigger.
    ///
    /// Idempotent: if the event already exists, the stored record is
    /// returned unchanged and the new trigger info is discarded (first
    /// writer wins).
    pub async fn record_trigger(
        &self,
        event_id: &str,
        trigger: TriggerInfo,
    ) -> EventLogResult<EventRecord> {
        match self.load(event_id).await {
            Ok(existing) => {
                tracing::debug!(event_id = %event_id, "Event record already exists");
                Ok(existing)
            }
            Err(EventLogError::UnknownEvent(_)) => {
                let record = EventRecord::new(event_id, trigger);
                self.save(&record).await?;
                tracing::info!(event_id = %event_id, "Event record created");
                Ok(record)
            }
            Err(e) => Err(e),
        }
    }

    /// Append an email attempt and advance the lifecycle if it was sent.
    ///
    /// `Failed` and `Invalid` attempts are appended for audit but never
    /// advance status: a failed send must not be mistaken for progress.
    /// Sent attempts advance along `Created → AwaitingResponse → Reminded
    /// → Escalated` according to the stage named by the template id; no
    /// state is ever skipped.
    pub async fn record_email_attempt(
        &self,
        event_id: &str,
        template_id: &str,
        recipient: &str,
        result: DeliveryResult,
    ) -> EventLogResult<EventRecord> {
        let mut record = self.load(event_id).await?;
        if record.status == EventStatus::Archived {
            return Err(EventLogError::AlreadyArchived(event_id.to_string()));
        }

        let stage = NotificationStage::classify(template_id);
        let next = if result.is_sent() {
            match (stage, record.status) {
                (NotificationStage::Initial, EventStatus::Created) => {
                    Some(EventStatus::AwaitingResponse)
                }
                (NotificationStage::Reminder, EventStatus::AwaitingResponse) => {
                    Some(EventStatus::Reminded)
                }
                (NotificationStage::Escalation, EventStatus::Reminded) => {
                    Some(EventStatus::Escalated)
                }
                _ => None,
            }
        } else {
            None
        };

        record.email_history.push(EmailAttempt {
            template_id: template_id.to_string(),
            recipient: recipient.to_string(),
            stage,
            result,
        });

        if let Some(next) = next {
            tracing::info!(
                event_id = %event_id,
                from = ?record.status,
                to = ?next,
                "Event status advanced"
            );
            record.status = next;
        }

        record.updated_at = Utc::now();
        self.save(&record).await?;
        Ok(record)
    }

    /// Append a processing error to the record's error history.
    pub async fn record_error(
        &self,
        event_id: &str,
        step_name: &str,
        message: &str,
        trace: Option<String>,
    ) -> EventLogResult<EventRecord> {
        let mut record = self.load(event_id).await?;
        record.error_history.push(ErrorEntry {
            occurred_at: Utc::now(),
            step_name: step_name.to_string(),
            message: message.to_string(),
            trace,
        });
        record.updated_at = Utc::now();
        self.save(&record).await?;
        Ok(record)
    }

    /// Mark the event resolved (a response was received).
    ///
    /// Valid from any non-archived state; resolving an already-resolved
    /// event is a no-op.
    pub async fn mark_resolved(&self, event_id: &str) -> EventLogResult<EventRecord> {
        let mut record = self.load(event_id).await?;
        match record.status {
            EventStatus::Archived => Err(EventLogError::AlreadyArchived(event_id.to_string())),
            EventStatus::Resolved => Ok(record),
            _ => {
                record.status = EventStatus::Resolved;
                record.updated_at = Utc::now();
                self.save(&record).await?;
                tracing::info!(event_id = %event_id, "Event resolved");
                Ok(record)
            }
        }
    }

    /// Explicit cleanup: archive a resolved event.
    ///
    /// Only `Resolved` records are archivable; anything else fails with
    /// [`EventLogError::NotResolved`], so open items cannot be silently
    /// lost.
    pub async fn archive(&self, event_id: &str) -> EventLogResult<()> {
        let mut record = self.load(event_id).await?;
        if record.status != EventStatus::Resolved {
            return Err(EventLogError::NotResolved {
                id: event_id.to_string(),
                status: record.status,
            });
        }

        let now = Utc::now();
        record.status = EventStatus::Archived;
        record.archived_at = Some(now);
        record.updated_at = now;
        self.save(&record).await?;
        tracing::info!(event_id = %event_id, "Event archived");
        Ok(())
    }

    /// Fetch the record for one event.
    pub async fn get(&self, event_id: &str) -> EventLogResult<EventRecord> {
        self.load(event_id).await
    }

    /// List stored event records, optionally filtered by status.
    pub async fn list(
        &self,
        status_filter: Option<EventStatus>,
    ) -> EventLogResult<Vec<EventRecord>> {
        let keys = self.store.list("events/").await?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let document = self.store.get(&key).await?;
            let record: EventRecord = serde_json::from_value(document).map_err(StoreError::from)?;
            if status_filter.map_or(true, |status| record.status == status) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::store::MemoryObjectStore;

    use super::*;

    fn manager() -> EventLogManager {
        EventLogManager::new(Arc::new(MemoryObjectStore::new("test")))
    }

    fn trigger() -> TriggerInfo {
        TriggerInfo {
            source: "calendar".to_string(),
            reason: "needs-response".to_string(),
            context: HashMap::from([("summary".to_string(), "Quarterly Review".to_string())]),
        }
    }

    fn other_trigger() -> TriggerInfo {
        TriggerInfo {
            source: "manual".to_string(),
            reason: "second-observation".to_string(),
            context: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_record_trigger_is_idempotent_first_writer_wins() {
        let manager = manager();

        let first = manager.record_trigger("evt-1", trigger()).await.unwrap();
        assert_eq!(first.status, EventStatus::Created);

        let second = manager
            .record_trigger("evt-1", other_trigger())
            .await
            .unwrap();
        assert_eq!(second.trigger.source, "calendar");
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_sent_attempts_advance_through_the_full_chain() {
        let manager = manager();
        manager.record_trigger("evt-1", trigger()).await.unwrap();

        let record = manager
            .record_email_attempt(
                "evt-1",
                "initial_request_template",
                "john@x.com",
                DeliveryResult::sent(Some("msg-1".to_string())),
            )
            .await
            .unwrap();
        assert_eq!(record.status, EventStatus::AwaitingResponse);

        let record = manager
            .record_email_attempt(
                "evt-1",
                "reminder_template",
                "john@x.com",
                DeliveryResult::sent(Some("msg-2".to_string())),
            )
            .await
            .unwrap();
        assert_eq!(record.status, EventStatus::Reminded);

        let record = manager
            .record_email_attempt(
                "evt-1",
                "escalation_template",
                "admin@example.com",
                DeliveryResult::sent(Some("msg-3".to_string())),
            )
            .await
            .unwrap();
        assert_eq!(record.status, EventStatus::Escalated);
        assert_eq!(record.email_history.len(), 3);
    }

    #[tokio::test]
    async fn test_second_reminder_stays_reminded() {
        let manager = manager();
        manager.record_trigger("evt-1", trigger()).await.unwrap();
        for template in ["initial_request_template", "reminder_template"] {
            manager
                .record_email_attempt("evt-1", template, "john@x.com", DeliveryResult::sent(None))
                .await
                .unwrap();
        }

        let record = manager
            .record_email_attempt(
                "evt-1",
                "reminder_template",
                "john@x.com",
                DeliveryResult::sent(None),
            )
            .await
            .unwrap();

        assert_eq!(record.status, EventStatus::Reminded);
        assert_eq!(record.email_history.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_attempt_is_recorded_without_progress() {
        let manager = manager();
        manager.record_trigger("evt-1", trigger()).await.unwrap();

        let record = manager
            .record_email_attempt(
                "evt-1",
                "initial_request_template",
                "john@x.com",
                DeliveryResult::failed("connection refused"),
            )
            .await
            .unwrap();

        assert_eq!(record.status, EventStatus::Created);
        assert_eq!(record.email_history.len(), 1);
    }

    #[tokio::test]
    async fn test_escalation_does_not_skip_states() {
        let manager = manager();
        manager.record_trigger("evt-1", trigger()).await.unwrap();
        manager
            .record_email_attempt(
                "evt-1",
                "initial_request_template",
                "john@x.com",
                DeliveryResult::sent(None),
            )
            .await
            .unwrap();

        // Escalation sent while still awaiting a reminder stage
        let record = manager
            .record_email_attempt(
                "evt-1",
                "escalation_template",
                "admin@example.com",
                DeliveryResult::sent(None),
            )
            .await
            .unwrap();

        assert_eq!(record.status, EventStatus::AwaitingResponse);
        assert_eq!(record.email_history.len(), 2);
    }

    #[tokio::test]
    async fn test_archive_requires_resolved() {
        let manager = manager();
        manager.record_trigger("evt-1", trigger()).await.unwrap();

        let err = manager.archive("evt-1").await.unwrap_err();
        assert!(matches!(
            err,
            EventLogError::NotResolved { status: EventStatus::Created, .. }
        ));

        manager.mark_resolved("evt-1").await.unwrap();
        manager.archive("evt-1").await.unwrap();

        // Archive succeeds exactly once
        let err = manager.archive("evt-1").await.unwrap_err();
        assert!(matches!(
            err,
            EventLogError::NotResolved { status: EventStatus::Archived, .. }
        ));
    }

    #[tokio::test]
    async fn test_resolve_is_valid_from_any_open_state() {
        let manager = manager();
        manager.record_trigger("evt-1", trigger()).await.unwrap();
        manager
            .record_email_attempt(
                "evt-1",
                "initial_request_template",
                "john@x.com",
                DeliveryResult::sent(None),
            )
            .await
            .unwrap();

        let record = manager.mark_resolved("evt-1").await.unwrap();
        assert_eq!(record.status, EventStatus::Resolved);

        // Resolving again is a no-op
        let again = manager.mark_resolved("evt-1").await.unwrap();
        assert_eq!(again.status, EventStatus::Resolved);
    }

    #[tokio::test]
    async fn test_unknown_event_is_reported() {
        let manager = manager();

        let err = manager.get("missing").await.unwrap_err();
        assert!(matches!(err, EventLogError::UnknownEvent(id) if id == "missing"));

        let err = manager.mark_resolved("missing").await.unwrap_err();
        assert!(matches!(err, EventLogError::UnknownEvent(_)));
    }

    #[tokio::test]
    async fn test_round_trip_preserves_all_fields() {
        let manager = manager();
        manager.record_trigger("evt-1", trigger()).await.unwrap();
        let written = manager
            .record_email_attempt(
                "evt-1",
                "initial_request_template",
                "john@x.com",
                DeliveryResult::sent(Some("msg-1".to_string())),
            )
            .await
            .unwrap();

        let read = manager.get("evt-1").await.unwrap();
        assert_eq!(read, written);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let manager = manager();
        manager.record_trigger("evt-1", trigger()).await.unwrap();
        manager.record_trigger("evt-2", trigger()).await.unwrap();
        manager.mark_resolved("evt-2").await.unwrap();

        let created = manager.list(Some(EventStatus::Created)).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].event_id, "evt-1");

        let all = manager.list(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_event_ids_are_sanitized_for_store_keys() {
        let manager = manager();
        manager
            .record_trigger("evt/with spaces", trigger())
            .await
            .unwrap();

        let record = manager.get("evt/with spaces").await.unwrap();
        // Original id is preserved in the record itself
        assert_eq!(record.event_id, "evt/with spaces");
    }
}
