use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Priority levels for outbound notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum Priority {
    /// Low priority, can be delayed
    Low,
    /// Normal priority (default)
    #[default]
    Normal,
    /// High priority, should be delivered promptly
    High,
    /// Critical priority, immediate delivery required
    Critical,
}

/// Classified outcome of one send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DeliveryOutcome {
    /// Provider accepted the message for delivery
    Sent,
    /// Transport, auth, or provider error; potentially transient
    Failed,
    /// Data problem (bad recipient, missing variables); do not retry
    /// without fixing the input
    Invalid,
}

/// Result of one attempted message send. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub outcome: DeliveryOutcome,
    /// Provider-assigned message id, when sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    /// Error detail, when failed or invalid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl DeliveryResult {
    pub fn sent(provider_id: Option<String>) -> Self {
        Self {
            outcome: DeliveryOutcome::Sent,
            provider_id,
            error: None,
            attempted_at: Utc::now(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            outcome: DeliveryOutcome::Failed,
            provider_id: None,
            error: Some(error.into()),
            attempted_at: Utc::now(),
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            outcome: DeliveryOutcome::Invalid,
            provider_id: None,
            error: Some(error.into()),
            attempted_at: Utc::now(),
        }
    }

    /// Whether the message was accepted for delivery.
    pub fn is_sent(&self) -> bool {
        self.outcome == DeliveryOutcome::Sent
    }
}

/// Dispatch-specific error type.
///
/// Everything else the dispatcher can observe is classified into a
/// [`DeliveryResult`] instead of an error: delivery outcomes are audit
/// data, not control flow.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Caller referenced a template that was never loaded
    #[error("Template not found: {0}")]
    UnknownTemplate(String),
}
