//! Template types and error definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::Priority;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid template ID: {0}")]
    InvalidId(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Every unbound placeholder is listed, so callers can fix their
    /// variable set in one pass.
    #[error("Missing template variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// An email template definition.
///
/// Subject and body may contain `{name}` placeholders. Templates are
/// immutable once loaded into a [`TemplateStore`](super::TemplateStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Unique template identifier (alphanumeric, dash, underscore)
    pub id: String,

    /// Subject line with `{name}` placeholders
    pub subject: String,

    /// Plain-text body with `{name}` placeholders
    pub body: String,

    /// Priority applied when the caller does not specify one
    #[serde(default)]
    pub default_priority: Priority,

    /// Template description (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Template {
    /// Validate the template
    pub fn validate(&self) -> TemplateResult<()> {
        if self.id.is_empty() || self.id.len() > 64 {
            return Err(TemplateError::InvalidId(
                "ID must be 1-64 characters".to_string(),
            ));
        }

        if !self
            .id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TemplateError::InvalidId(
                "ID must contain only alphanumeric, dash, or underscore".to_string(),
            ));
        }

        if self.subject.is_empty() {
            return Err(TemplateError::InvalidTemplate(
                "Subject must not be empty".to_string(),
            ));
        }

        if self.body.is_empty() {
            return Err(TemplateError::InvalidTemplate(
                "Body must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Rendered subject and body produced by the template engine.
///
/// Not persisted on its own; the delivery outcome it fed is folded into
/// the event record's email history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedText {
    pub subject: String,
    pub body: String,
}
