//! Workflow execution ledger.
//!
//! One [`WorkflowRun`] per end-to-end execution, stored as a whole JSON
//! document at `workflow_log/{run_id}.json`. Steps are append-only and
//! strictly time-ordered; once a run reaches `Completed` or `Failed` it is
//! closed and rejects further writes. `record_exception` is the one
//! deliberately infallible entry point: audit logging must never abort
//! the workflow it is auditing.

mod manager;
mod types;

pub use manager::{generate_run_id, WorkflowLogManager};
pub use types::{
    ErrorDetail, RunOutcome, RunStats, RunStatus, RunSummary, StepOutcome, StepRecord,
    WorkflowLogError, WorkflowLogResult, WorkflowRun,
};
