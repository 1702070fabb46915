//! Immutable template catalog.
//!
//! Templates are loaded once at startup (from config or the built-in set)
//! and never mutated afterwards. Rendering goes through the engine in
//! [`super::engine`].

use std::collections::HashMap;

use crate::dispatch::Priority;

use super::engine::{render, Variables};
use super::types::{RenderedText, Template, TemplateError, TemplateResult};

/// Template id for the first notification asking a human to respond.
pub const INITIAL_REQUEST_TEMPLATE: &str = "initial_request_template";
/// Template id for follow-up reminders (first and second reminder alike).
pub const REMINDER_TEMPLATE: &str = "reminder_template";
/// Template id for escalations after unanswered reminders.
pub const ESCALATION_TEMPLATE: &str = "escalation_template";
/// Template id for workflow error reports to the admin address.
pub const ERROR_NOTIFICATION_TEMPLATE: &str = "error_notification_template";

/// Read-only mapping from template id to template.
pub struct TemplateStore {
    templates: HashMap<String, Template>,
}

impl TemplateStore {
    /// Build a store from already-loaded templates.
    ///
    /// Every template is validated; duplicate ids are rejected.
    pub fn from_templates(templates: Vec<Template>) -> TemplateResult<Self> {
        let mut map = HashMap::with_capacity(templates.len());
        for template in templates {
            template.validate()?;
            if map.contains_key(&template.id) {
                return Err(TemplateError::AlreadyExists(template.id));
            }
            map.insert(template.id.clone(), template);
        }
        Ok(Self { templates: map })
    }

    /// Build a store holding the built-in notification templates.
    pub fn with_defaults() -> Self {
        let templates = vec![
            Template {
                id: INITIAL_REQUEST_TEMPLATE.to_string(),
                subject: "Action Required: Please Respond to {event_summary}".to_string(),
                body: "Hello,\n\nWe need your response for event {event_id}.\n\nEvent: {event_summary}\nDate: {event_datetime}\n\nPlease reply with the requested information.\n\nBest regards,\nNotification System".to_string(),
                default_priority: Priority::Normal,
                description: Some("First request sent when a trigger is observed".to_string()),
            },
            Template {
                id: REMINDER_TEMPLATE.to_string(),
                subject: "Reminder: Follow-up Required for {event_summary}".to_string(),
                body: "Hello {organizer_email},\n\nThis is a reminder for your event:\n{event_summary}\nDate: {event_datetime}\n\nBest regards,\nNotification System".to_string(),
                default_priority: Priority::Normal,
                description: Some("Reminder sent while a response is outstanding".to_string()),
            },
            Template {
                id: ESCALATION_TEMPLATE.to_string(),
                subject: "Escalation: No Response for Event {event_id}".to_string(),
                body: "Hello Admin,\n\nNo response was received for event {event_id}: {event_summary}\nOrganizer: {organizer_email}\n\nBest regards,\nNotification System".to_string(),
                default_priority: Priority::High,
                description: Some("Escalation sent after unanswered reminders".to_string()),
            },
            Template {
                id: ERROR_NOTIFICATION_TEMPLATE.to_string(),
                subject: "System Error During Workflow Execution".to_string(),
                body: "Hello Admin,\n\nAn error occurred during workflow execution:\nRun ID: {run_id}\nStep: {step_name}\nError: {error_message}\n\nBest regards,\nNotification System".to_string(),
                default_priority: Priority::High,
                description: Some("Error report delivered to the admin address".to_string()),
            },
        ];

        // Built-in templates are statically valid
        Self::from_templates(templates).expect("built-in templates are valid")
    }

    /// Get a template by ID
    pub fn get(&self, id: &str) -> TemplateResult<&Template> {
        self.templates
            .get(id)
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }

    /// Check if a template exists
    pub fn exists(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Get the number of templates
    pub fn count(&self) -> usize {
        self.templates.len()
    }

    /// Render a template with variables
    pub fn render(&self, id: &str, variables: &Variables) -> TemplateResult<RenderedText> {
        let template = self.get(id)?;
        render(template, variables)
    }
}
