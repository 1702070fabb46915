//! Mail-transfer capability.
//!
//! The dispatcher never talks to a mail provider directly; it hands a fully
//! rendered message to a [`Mailer`] and classifies whatever comes back.
//! Differently-configured providers are produced by the factory from the
//! same trait, no subclassing involved.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MailConfig;
use crate::dispatch::Priority;

mod recording;

pub use recording::RecordingMailer;

/// A fully rendered message handed to the mail-transfer capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub priority: Priority,
}

/// What the capability reports back for one send attempt.
#[derive(Debug, Clone)]
pub struct MailerResponse {
    /// Whether the provider accepted the message for delivery
    pub accepted: bool,
    /// Provider-assigned message id, when accepted
    pub provider_id: Option<String>,
    /// Provider error detail, when rejected
    pub error: Option<String>,
}

/// Transport-level failures raised before the provider could answer.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("mail transport timed out: {0}")]
    Timeout(String),

    #[error("mail transport unavailable: {0}")]
    Unavailable(String),
}

/// One external send attempt per call; retry policy belongs to the caller.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<MailerResponse, MailerError>;
}

/// Create a mailer backend based on configuration.
///
/// Returns the implementation selected by the `transport` setting:
/// - `"recording"` (default): a [`RecordingMailer`] that accepts everything
///   and keeps the messages in memory
///
/// Unknown transport names fall back to recording with a warning.
pub fn create_mailer(settings: &MailConfig) -> Arc<dyn Mailer> {
    match settings.transport.as_str() {
        "recording" => {
            tracing::info!(transport = "recording", "Creating recording mailer");
            Arc::new(RecordingMailer::new())
        }
        other => {
            tracing::warn!(
                transport = %other,
                "Unknown mail transport, falling back to recording"
            );
            Arc::new(RecordingMailer::new())
        }
    }
}
