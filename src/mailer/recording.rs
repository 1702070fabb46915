//! In-memory mailer that records every outbound message.
//!
//! Used by tests and local development. Sends are accepted and assigned
//! sequential provider ids unless a failure has been scripted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Mailer, MailerError, MailerResponse, OutboundEmail};

/// Scripted behavior for the next sends.
#[derive(Debug, Clone)]
enum Script {
    /// Provider rejects the message with this error detail
    Reject(String),
    /// Transport itself fails before reaching the provider
    Unavailable(String),
}

/// Mailer backend that stores messages instead of delivering them.
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    script: Mutex<Option<Script>>,
    counter: AtomicU64,
}

impl Default for RecordingMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            script: Mutex::new(None),
            counter: AtomicU64::new(0),
        }
    }

    /// Make subsequent sends come back rejected with the given error,
    /// until [`accept_again`](Self::accept_again) is called.
    pub fn reject_with(&self, error: &str) {
        *self.script.lock().unwrap() = Some(Script::Reject(error.to_string()));
    }

    /// Make subsequent sends fail at the transport level.
    pub fn fail_with(&self, error: &str) {
        *self.script.lock().unwrap() = Some(Script::Unavailable(error.to_string()));
    }

    /// Clear any scripted failure.
    pub fn accept_again(&self) {
        *self.script.lock().unwrap() = None;
    }

    /// Messages accepted so far, in send order.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of messages accepted so far.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<MailerResponse, MailerError> {
        let script = self.script.lock().unwrap().clone();
        match script {
            Some(Script::Reject(error)) => Ok(MailerResponse {
                accepted: false,
                provider_id: None,
                error: Some(error),
            }),
            Some(Script::Unavailable(error)) => Err(MailerError::Unavailable(error)),
            None => {
                let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
                self.sent.lock().unwrap().push(email.clone());
                tracing::debug!(
                    recipient = %email.recipient,
                    subject = %email.subject,
                    "Recorded outbound email"
                );
                Ok(MailerResponse {
                    accepted: true,
                    provider_id: Some(format!("msg-{n}")),
                    error: None,
                })
            }
        }
    }
}
