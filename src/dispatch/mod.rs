//! Notification dispatcher.
//!
//! Renders a named template, validates the recipient, performs exactly one
//! send through the mail-transfer capability, and classifies the outcome
//! into a [`DeliveryResult`]. The dispatcher never retries; repeated
//! attempts are the caller's decision and show up as distinct entries in
//! the audit ledgers.

use std::sync::Arc;

use crate::config::MailConfig;
use crate::mailer::{Mailer, OutboundEmail};
use crate::template::{
    TemplateError, TemplateStore, Variables, ERROR_NOTIFICATION_TEMPLATE,
};

mod types;

pub use types::{DeliveryOutcome, DeliveryResult, DispatchError, Priority};

/// Minimal recipient syntax check: one `@`, non-empty local part, dotted
/// domain, no whitespace. Anything stricter belongs to the provider.
pub(crate) fn is_valid_address(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Sends templated notifications through the mail-transfer capability.
pub struct NotificationDispatcher {
    templates: Arc<TemplateStore>,
    mailer: Arc<dyn Mailer>,
    from_address: String,
    admin_address: String,
}

impl NotificationDispatcher {
    /// Create a dispatcher over the given template catalog and mailer.
    pub fn new(templates: Arc<TemplateStore>, mailer: Arc<dyn Mailer>, mail: &MailConfig) -> Self {
        Self {
            templates,
            mailer,
            from_address: mail.from_address.clone(),
            admin_address: mail.admin_address.clone(),
        }
    }

    /// Render the named template and attempt one send to `recipient`.
    ///
    /// Fails with [`DispatchError::UnknownTemplate`] when the template id is
    /// not loaded. All other problems come back as a classified
    /// [`DeliveryResult`]:
    /// - bad recipient syntax → `Invalid`, without contacting the mailer
    /// - missing template variables → `Invalid`, carrying the full list
    /// - transport or provider error → `Failed`
    /// - acceptance → `Sent` with the provider's message id
    pub async fn send_templated(
        &self,
        template_id: &str,
        recipient: &str,
        variables: &Variables,
        priority: Option<Priority>,
    ) -> Result<DeliveryResult, DispatchError> {
        let template = self.templates.get(template_id).map_err(|_| {
            DispatchError::UnknownTemplate(template_id.to_string())
        })?;

        // Syntax problems must short-circuit before any network interaction
        if !is_valid_address(recipient) {
            tracing::debug!(
                template_id = %template_id,
                recipient = %recipient,
                "Rejecting send to syntactically invalid recipient"
            );
            return Ok(DeliveryResult::invalid(format!(
                "invalid recipient address: {recipient}"
            )));
        }

        // Rendering failures are data problems, not transport problems
        let rendered = match self.templates.render(template_id, variables) {
            Ok(rendered) => rendered,
            Err(e @ TemplateError::MissingVariables(_)) => {
                tracing::debug!(
                    template_id = %template_id,
                    error = %e,
                    "Template rendering failed"
                );
                return Ok(DeliveryResult::invalid(e.to_string()));
            }
            Err(e) => return Ok(DeliveryResult::invalid(e.to_string())),
        };

        let email = OutboundEmail {
            from: self.from_address.clone(),
            recipient: recipient.to_string(),
            subject: rendered.subject,
            body: rendered.body,
            priority: priority.unwrap_or(template.default_priority),
        };

        match self.mailer.send(&email).await {
            Ok(response) if response.accepted => {
                tracing::info!(
                    template_id = %template_id,
                    recipient = %recipient,
                    provider_id = ?response.provider_id,
                    "Email accepted for delivery"
                );
                Ok(DeliveryResult::sent(response.provider_id))
            }
            Ok(response) => {
                let error = response
                    .error
                    .unwrap_or_else(|| "rejected by mail provider".to_string());
                tracing::warn!(
                    template_id = %template_id,
                    recipient = %recipient,
                    error = %error,
                    "Email rejected by mail provider"
                );
                Ok(DeliveryResult::failed(error))
            }
            Err(e) => {
                tracing::warn!(
                    template_id = %template_id,
                    recipient = %recipient,
                    error = %e,
                    "Mail transport failed"
                );
                Ok(DeliveryResult::failed(e.to_string()))
            }
        }
    }

    /// Report a workflow error to the configured admin address.
    pub async fn send_error_notification(
        &self,
        run_id: &str,
        step_name: &str,
        error_message: &str,
    ) -> Result<DeliveryResult, DispatchError> {
        let mut variables = Variables::new();
        variables.insert("run_id".to_string(), run_id.to_string());
        variables.insert("step_name".to_string(), step_name.to_string());
        variables.insert("error_message".to_string(), error_message.to_string());

        let admin = self.admin_address.clone();
        self.send_templated(
            ERROR_NOTIFICATION_TEMPLATE,
            &admin,
            &variables,
            Some(Priority::High),
        )
        .await
    }
}
