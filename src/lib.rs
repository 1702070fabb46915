// Capability layer (external collaborators)
pub mod mailer;
pub mod store;

// Domain layer (business logic)
pub mod dispatch;
pub mod event_log;
pub mod template;
pub mod workflow_log;

// Supporting modules
pub mod config;
