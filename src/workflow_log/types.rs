//! Workflow run types and error definitions

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Workflow-log-specific error type
#[derive(Debug, Error)]
pub enum WorkflowLogError {
    /// Caller referenced a run id that was never started
    #[error("Unknown run: {0}")]
    UnknownRun(String),

    /// A run with this id already exists
    #[error("Run already exists: {0}")]
    DuplicateRun(String),

    /// The run reached a terminal status; no further mutation is accepted
    #[error("Run is closed: {0}")]
    RunClosed(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for workflow log operations
pub type WorkflowLogResult<T> = Result<T, WorkflowLogError>;

/// Overall status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    /// Terminal statuses accept no further steps.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Terminal disposition passed to `finish_run`. Keeping this separate from
/// [`RunStatus`] makes closing a run with `Running` unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed,
}

impl From<RunOutcome> for RunStatus {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed => Self::Completed,
            RunOutcome::Failed => Self::Failed,
        }
    }
}

/// Outcome of one workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepOutcome {
    Success,
    Error,
}

/// Structured error detail captured at the point of failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    /// Full trace text, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: None,
        }
    }

    pub fn with_trace(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: Some(trace.into()),
        }
    }
}

/// One audited step of a workflow run. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub outcome: StepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    /// Arbitrary correlation payload (e.g. the event id a step touched)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,
}

/// Durable record of one end-to-end workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Set at most once, when the run reaches a terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    /// Append-only, strictly time-ordered
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

impl WorkflowRun {
    pub(crate) fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            status: RunStatus::Running,
            steps: Vec::new(),
        }
    }
}

/// Per-run reporting numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub step_count: usize,
    /// Wall-clock duration; measured up to now for still-running runs
    pub duration_seconds: f64,
    pub error_count: usize,
}

/// Aggregate reporting numbers over a set of runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_runs: usize,
    /// Fraction of runs that completed successfully, 0.0 when empty
    pub success_rate: f64,
    pub average_duration_seconds: f64,
}
