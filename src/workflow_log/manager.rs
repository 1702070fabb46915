//! Workflow log manager over the durable object store.
//!
//! One JSON document per run at `workflow_log/{run_id}.json`, rewritten in
//! full on every mutation. The same single-writer-per-id assumption as the
//! event log applies.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::store::{ObjectStore, StoreError};

use super::types::{
    ErrorDetail, RunOutcome, RunStats, RunStatus, RunSummary, StepOutcome, StepRecord,
    WorkflowLogError, WorkflowLogResult, WorkflowRun,
};

/// Generate a unique, sortable run id: UTC timestamp plus a uuid fragment.
pub fn generate_run_id() -> String {
    let fragment = Uuid::new_v4().simple().to_string();
    format!("{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), &fragment[..8])
}

/// Manages workflow execution records in the object store.
pub struct WorkflowLogManager {
    store: Arc<dyn ObjectStore>,
}

impl WorkflowLogManager {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    fn key(run_id: &str) -> String {
        format!("workflow_log/{run_id}.json")
    }

    async fn load(&self, run_id: &str) -> WorkflowLogResult<WorkflowRun> {
        let document = self.store.get(&Self::key(run_id)).await.map_err(|e| match e {
            StoreError::NotFound(_) => WorkflowLogError::UnknownRun(run_id.to_string()),
            other => WorkflowLogError::Storage(other),
        })?;
        let run = serde_json::from_value(document).map_err(StoreError::from)?;
        Ok(run)
    }

    async fn save(&self, run: &WorkflowRun) -> WorkflowLogResult<()> {
        let document = serde_json::to_value(run).map_err(StoreError::from)?;
        self.store.put(&Self::key(&run.run_id), document).await?;
        Ok(())
    }

    /// Open a new run. Fails with [`WorkflowLogError::DuplicateRun`] if the
    /// id is already taken.
    pub async fn start_run(&self, run_id: &str) -> WorkflowLogResult<WorkflowRun> {
        if self.store.exists(&Self::key(run_id)).await? {
            return Err(WorkflowLogError::DuplicateRun(run_id.to_string()));
        }

        let run = WorkflowRun::new(run_id);
        self.save(&run).await?;
        tracing::info!(run_id = %run_id, "Workflow run started");
        Ok(run)
    }

    /// Append a step with the current time as its end time.
    ///
    /// The start time defaults to the previous step's end (or the run
    /// start), giving contiguous timing coverage.
    pub async fn record_step(
        &self,
        run_id: &str,
        step_name: &str,
        outcome: StepOutcome,
        error: Option<ErrorDetail>,
    ) -> WorkflowLogResult<()> {
        self.record_step_with(run_id, step_name, outcome, error, None, HashMap::new())
            .await
    }

    /// Append a step with an explicit start time and context payload.
    pub async fn record_step_with(
        &self,
        run_id: &str,
        step_name: &str,
        outcome: StepOutcome,
        error: Option<ErrorDetail>,
        started_at: Option<DateTime<Utc>>,
        context: HashMap<String, String>,
    ) -> WorkflowLogResult<()> {
        let mut run = self.load(run_id).await?;
        if run.status.is_terminal() {
            return Err(WorkflowLogError::RunClosed(run_id.to_string()));
        }

        let ended_at = Utc::now();
        let started_at = started_at.unwrap_or_else(|| {
            run.steps
                .last()
                .map(|step| step.ended_at)
                .unwrap_or(run.started_at)
        });

        run.steps.push(StepRecord {
            step_name: step_name.to_string(),
            started_at,
            ended_at,
            outcome,
            error,
            context,
        });
        self.save(&run).await?;

        tracing::debug!(
            run_id = %run_id,
            step = %step_name,
            outcome = ?outcome,
            "Workflow step recorded"
        );
        Ok(())
    }

    /// Record a failed step from captured error detail.
    ///
    /// Never fails the calling workflow: audit logging must not become a
    /// cause of workflow failure, so storage problems are reported on the
    /// local error channel and swallowed here.
    pub async fn record_exception(&self, run_id: &str, step_name: &str, error: ErrorDetail) {
        let message = error.message.clone();
        if let Err(e) = self
            .record_step(run_id, step_name, StepOutcome::Error, Some(error))
            .await
        {
            tracing::warn!(
                run_id = %run_id,
                step = %step_name,
                original_error = %message,
                log_error = %e,
                "Failed to record workflow exception"
            );
        }
    }

    /// Close the run with a terminal status. Idempotent-once: a second
    /// call fails with [`WorkflowLogError::RunClosed`] and the first
    /// status stands.
    pub async fn finish_run(&self, run_id: &str, outcome: RunOutcome) -> WorkflowLogResult<()> {
        let mut run = self.load(run_id).await?;
        if run.status.is_terminal() {
            return Err(WorkflowLogError::RunClosed(run_id.to_string()));
        }

        run.status = outcome.into();
        run.ended_at = Some(Utc::now());
        self.save(&run).await?;
        tracing::info!(run_id = %run_id, status = ?run.status, "Workflow run finished");
        Ok(())
    }

    /// Fetch the record for one run.
    pub async fn get(&self, run_id: &str) -> WorkflowLogResult<WorkflowRun> {
        self.load(run_id).await
    }

    /// Reporting numbers for one run.
    pub async fn stats(&self, run_id: &str) -> WorkflowLogResult<RunStats> {
        let run = self.load(run_id).await?;
        Ok(Self::stats_for(&run))
    }

    fn stats_for(run: &WorkflowRun) -> RunStats {
        let end = run.ended_at.unwrap_or_else(Utc::now);
        RunStats {
            step_count: run.steps.len(),
            duration_seconds: (end - run.started_at).num_milliseconds() as f64 / 1000.0,
            error_count: run
                .steps
                .iter()
                .filter(|step| step.outcome == StepOutcome::Error)
                .count(),
        }
    }

    /// Aggregate reporting over a set of runs.
    pub async fn summarize(&self, run_ids: &[String]) -> WorkflowLogResult<RunSummary> {
        let mut completed = 0usize;
        let mut total_duration = 0.0f64;
        for run_id in run_ids {
            let run = self.load(run_id).await?;
            if run.status == RunStatus::Completed {
                completed += 1;
            }
            total_duration += Self::stats_for(&run).duration_seconds;
        }

        let total_runs = run_ids.len();
        Ok(RunSummary {
            total_runs,
            success_rate: if total_runs == 0 {
                0.0
            } else {
                completed as f64 / total_runs as f64
            },
            average_duration_seconds: if total_runs == 0 {
                0.0
            } else {
                total_duration / total_runs as f64
            },
        })
    }

    /// List all stored runs.
    pub async fn list(&self) -> WorkflowLogResult<Vec<WorkflowRun>> {
        let keys = self.store.list("workflow_log/").await?;
        let mut runs = Vec::with_capacity(keys.len());
        for key in keys {
            let document = self.store.get(&key).await?;
            let run = serde_json::from_value(document).map_err(StoreError::from)?;
            runs.push(run);
        }
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::store::MemoryObjectStore;

    use super::*;

    fn manager() -> WorkflowLogManager {
        WorkflowLogManager::new(Arc::new(MemoryObjectStore::new("test")))
    }

    /// Store double whose writes always fail.
    struct UnavailableStore;

    #[async_trait]
    impl ObjectStore for UnavailableStore {
        async fn put(&self, _key: &str, _document: serde_json::Value) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("store offline".to_string()))
        }

        async fn get(&self, _key: &str) -> Result<serde_json::Value, StoreError> {
            Err(StoreError::Unavailable("store offline".to_string()))
        }

        async fn list(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("store offline".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("store offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_start_run_rejects_duplicates() {
        let manager = manager();
        manager.start_run("run-1").await.unwrap();

        let err = manager.start_run("run-1").await.unwrap_err();
        assert!(matches!(err, WorkflowLogError::DuplicateRun(id) if id == "run-1"));
    }

    #[tokio::test]
    async fn test_steps_are_appended_with_contiguous_timing() {
        let manager = manager();
        manager.start_run("run-1").await.unwrap();

        manager
            .record_step("run-1", "fetch-trigger", StepOutcome::Success, None)
            .await
            .unwrap();
        manager
            .record_step("run-1", "send-initial", StepOutcome::Success, None)
            .await
            .unwrap();

        let run = manager.get("run-1").await.unwrap();
        assert_eq!(run.steps.len(), 2);
        assert_eq!(run.steps[0].started_at, run.started_at);
        assert_eq!(run.steps[1].started_at, run.steps[0].ended_at);
        assert!(run.steps[1].ended_at >= run.steps[1].started_at);
    }

    #[tokio::test]
    async fn test_run_closed_after_finish() {
        let manager = manager();
        manager.start_run("run-1").await.unwrap();
        manager
            .finish_run("run-1", RunOutcome::Completed)
            .await
            .unwrap();

        let err = manager
            .record_step("run-1", "late-step", StepOutcome::Success, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowLogError::RunClosed(_)));

        // A second finish fails and the first status stands
        let err = manager
            .finish_run("run-1", RunOutcome::Failed)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowLogError::RunClosed(_)));
        let run = manager.get("run-1").await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_finish_sets_end_time_once() {
        let manager = manager();
        manager.start_run("run-1").await.unwrap();
        assert!(manager.get("run-1").await.unwrap().ended_at.is_none());

        manager
            .finish_run("run-1", RunOutcome::Failed)
            .await
            .unwrap();
        let run = manager.get("run-1").await.unwrap();
        assert!(run.ended_at.is_some());
        assert_eq!(run.status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_record_exception_populates_error_detail() {
        let manager = manager();
        manager.start_run("run-1").await.unwrap();

        manager
            .record_exception(
                "run-1",
                "send-initial",
                ErrorDetail::with_trace("template rendering failed", "at dispatch::send_templated"),
            )
            .await;

        let run = manager.get("run-1").await.unwrap();
        assert_eq!(run.steps.len(), 1);
        assert_eq!(run.steps[0].outcome, StepOutcome::Error);
        let error = run.steps[0].error.as_ref().unwrap();
        assert_eq!(error.message, "template rendering failed");
        assert!(error.trace.is_some());
    }

    #[tokio::test]
    async fn test_record_exception_swallows_storage_failures() {
        let manager = WorkflowLogManager::new(Arc::new(UnavailableStore));

        // Must not panic or propagate; the workflow being audited goes on
        manager
            .record_exception("run-1", "send-initial", ErrorDetail::new("boom"))
            .await;
    }

    #[tokio::test]
    async fn test_stats_counts_steps_and_errors() {
        let manager = manager();
        manager.start_run("run-1").await.unwrap();
        manager
            .record_step("run-1", "a", StepOutcome::Success, None)
            .await
            .unwrap();
        manager
            .record_step(
                "run-1",
                "b",
                StepOutcome::Error,
                Some(ErrorDetail::new("boom")),
            )
            .await
            .unwrap();
        manager
            .finish_run("run-1", RunOutcome::Failed)
            .await
            .unwrap();

        let stats = manager.stats("run-1").await.unwrap();
        assert_eq!(stats.step_count, 2);
        assert_eq!(stats.error_count, 1);
        assert!(stats.duration_seconds >= 0.0);
    }

    #[tokio::test]
    async fn test_summarize_across_runs() {
        let manager = manager();
        for (run_id, outcome) in [
            ("run-1", RunOutcome::Completed),
            ("run-2", RunOutcome::Completed),
            ("run-3", RunOutcome::Failed),
        ] {
            manager.start_run(run_id).await.unwrap();
            manager.finish_run(run_id, outcome).await.unwrap();
        }

        let ids: Vec<String> = ["run-1", "run-2", "run-3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let summary = manager.summarize(&ids).await.unwrap();
        assert_eq!(summary.total_runs, 3);
        assert!((summary.success_rate - 2.0 / 3.0).abs() < f64::EPSILON);
        assert!(summary.average_duration_seconds >= 0.0);
    }

    #[tokio::test]
    async fn test_summarize_empty_set() {
        let manager = manager();
        let summary = manager.summarize(&[]).await.unwrap();
        assert_eq!(summary.total_runs, 0);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_unknown_run_is_reported() {
        let manager = manager();
        let err = manager.stats("missing").await.unwrap_err();
        assert!(matches!(err, WorkflowLogError::UnknownRun(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_list_returns_all_runs() {
        let manager = manager();
        manager.start_run("run-1").await.unwrap();
        manager.start_run("run-2").await.unwrap();

        let runs = manager.list().await.unwrap();
        assert_eq!(runs.len(), 2);
    }

    #[test]
    fn test_generated_run_ids_are_unique() {
        let a = generate_run_id();
        let b = generate_run_id();
        assert_ne!(a, b);
        // Timestamp prefix plus underscore plus 8-char fragment
        assert_eq!(a.len(), "YYYYMMDD_HHMMSS_".len() + 8);
    }
}
