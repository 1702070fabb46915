//! Email template system.
//!
//! This module provides:
//! - Template definition with `{name}` variable placeholders
//! - A pure rendering engine that validates variable presence up front
//! - An immutable template catalog loaded once at startup
//!
//! Rendering has no side effects: no clocks, no randomness, no storage.
//! A render either produces deterministic text or fails naming every
//! missing variable at once.

mod engine;
mod store;
mod types;

pub use engine::{render, scan_placeholders, Variables};
pub use store::{
    TemplateStore, ERROR_NOTIFICATION_TEMPLATE, ESCALATION_TEMPLATE, INITIAL_REQUEST_TEMPLATE,
    REMINDER_TEMPLATE,
};
pub use types::{RenderedText, Template, TemplateError, TemplateResult};
