//! The single consumer: list variables, apply the credential policy, report.
//!
//! One [`Worker`] runs per process for its whole lifetime. Jobs are handled one
//! at a time, and after each one the worker sleeps for [`WorkerConfig::pace`]
//! regardless of how long the job took, so the platform sees at most roughly
//! one lookup and one callback per pace interval.
//!
//! Nothing that happens here reaches the HTTP caller; every failure is logged
//! and the job is considered done.

use std::sync::Arc;
use std::time::Duration;

use runtask::policy::{self, LookupFailurePolicy};
use runtask::{JobId, RestrictedKeys, RunId, TaskResult, TaskResultSink, VariableSource};
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};

use crate::queue::{Job, JobReceiver};

/// Pause between two jobs in production.
pub const WORKER_PACE: Duration = Duration::from_secs(1);

/// How long shutdown waits for queued jobs before abandoning them.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Read-only settings for the worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Unconditional sleep after each job.
    pub pace: Duration,
    pub restricted_keys: Arc<RestrictedKeys>,
    pub lookup_failure: LookupFailurePolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pace: WORKER_PACE,
            restricted_keys: Arc::new(RestrictedKeys::default()),
            lookup_failure: LookupFailurePolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Job outcome
// ---------------------------------------------------------------------------

/// How the variable lookup went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The platform listed this many variables.
    Listed(usize),
    /// Not attempted: the payload carried no workspace id.
    Skipped,
    /// Attempted and failed; holds the error text.
    Failed(String),
}

/// How the task-result callback went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// Not attempted: the payload lacked an access token or callback URL.
    Skipped,
    /// Attempted and failed; holds the error text. Never retried.
    Failed(String),
}

/// Summary of one processed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: JobId,
    pub run_id: RunId,
    pub lookup: LookupOutcome,
    /// Restricted keys found, in listing order.
    pub found: Vec<String>,
    pub result: TaskResult,
    pub delivery: DeliveryOutcome,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

pub struct Worker {
    receiver: JobReceiver,
    variables: Arc<dyn VariableSource>,
    results: Arc<dyn TaskResultSink>,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(
        receiver: JobReceiver,
        variables: Arc<dyn VariableSource>,
        results: Arc<dyn TaskResultSink>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            receiver,
            variables,
            results,
            config,
        }
    }

    /// Starts [`run`](Self::run) as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Waits up to `grace` for a spawned worker to drain and stop, then aborts
    /// it. Every sender must already be dropped or this always hits the limit.
    ///
    /// Returns `true` when the worker finished on its own. An aborted worker
    /// may be cut off between the lookup and the callback of its current job.
    pub async fn finish(mut handle: JoinHandle<()>, grace: Duration) -> bool {
        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                error!(error = %err, "Worker task ended abnormally");
                false
            }
            Err(_) => {
                handle.abort();
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "Worker did not drain in time; abandoning queued jobs"
                );
                false
            }
        }
    }

    /// Drains the queue until every sender is gone.
    ///
    /// In production the ingestion endpoint holds a sender for the life of the
    /// process, so this only returns during shutdown.
    pub async fn run(mut self) {
        info!(
            pace_ms = self.config.pace.as_millis() as u64,
            restricted_keys = self.config.restricted_keys.len(),
            lookup_failure = ?self.config.lookup_failure,
            "Worker started"
        );

        while let Some(job) = self.receiver.next().await {
            self.process(job).await;
            tokio::time::sleep(self.config.pace).await;
        }

        info!("Job queue closed; worker stopping");
    }

    /// Handles one job end to end. Never fails: errors are logged and recorded
    /// in the returned report.
    pub async fn process(&self, job: Job) -> JobReport {
        let span = tracing::info_span!(
            "job",
            job_id = %job.id,
            run_id = %job.payload.run_id,
            workspace_id = %job.payload.workspace_id,
            organization = %job.payload.organization_name,
        );
        self.process_job(job).instrument(span).await
    }

    async fn process_job(&self, job: Job) -> JobReport {
        let Job {
            id,
            enqueued_at,
            payload,
        } = job;
        info!(
            queued_ms = enqueued_at.elapsed_ms(),
            stage = %payload.stage,
            enforcement_level = %payload.task_result_enforcement_level,
            "Processing job"
        );

        // 1. Lookup. No deadline is carried over from the inbound request.
        let (lookup, variables) = if !payload.can_look_up() {
            warn!("Payload has no workspace id; skipping variable lookup");
            (LookupOutcome::Skipped, None)
        } else {
            match self.variables.list_variables(&payload.workspace_id).await {
                Ok(variables) => (LookupOutcome::Listed(variables.len()), Some(variables)),
                Err(err) => {
                    error!(error = %err, "Failed to list workspace variables");
                    (LookupOutcome::Failed(err.to_string()), None)
                }
            }
        };

        // 2 + 3. Policy and verdict.
        let (found, result) = match variables {
            Some(variables) => {
                let found = self
                    .config
                    .restricted_keys
                    .find_restricted(variables.iter().map(|v| v.key.as_str()));
                let result = policy::evaluate(&found);
                (found, result)
            }
            None => (Vec::new(), self.unchecked_result(&lookup)),
        };
        if !found.is_empty() {
            warn!(keys = %found.join(", "), "Workspace carries restricted credential variables");
        }

        // 4. Callback, at most once.
        let delivery = match payload.callback_target() {
            None => {
                warn!("Payload has no access token or callback URL; not reporting a result");
                DeliveryOutcome::Skipped
            }
            Some(target) => match self.results.send_task_result(&target, &result).await {
                Ok(()) => DeliveryOutcome::Sent,
                Err(err) => {
                    error!(error = %err, status = ?err.status(), "Failed to send task result");
                    DeliveryOutcome::Failed(err.to_string())
                }
            },
        };

        // 5.
        info!(status = %result.status, delivery = ?delivery, "Job complete");

        JobReport {
            job_id: id,
            run_id: payload.run_id,
            lookup,
            found,
            result,
            delivery,
        }
    }

    /// Verdict used when the variables could not be inspected.
    fn unchecked_result(&self, lookup: &LookupOutcome) -> TaskResult {
        match self.config.lookup_failure {
            LookupFailurePolicy::FailOpen => policy::evaluate(&[]),
            LookupFailurePolicy::FailClosed => {
                let reason = match lookup {
                    LookupOutcome::Failed(message) => message.as_str(),
                    _ => "the payload did not name a workspace",
                };
                TaskResult::failed(policy::lookup_failed_message(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use runtask::{
        AccessToken, CallbackTarget, InvocationPayload, RemoteError, TaskResultStatus,
        WorkspaceId, WorkspaceVariable,
    };

    use super::*;
    use crate::queue::JobQueue;

    /// Returns canned variables, or a transport error when `variables` is `None`.
    struct FakeVariables {
        variables: Option<Vec<WorkspaceVariable>>,
        calls: Mutex<Vec<WorkspaceId>>,
    }

    impl FakeVariables {
        fn with_keys(keys: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                variables: Some(keys.iter().map(|k| WorkspaceVariable::env(*k, "v")).collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                variables: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl VariableSource for FakeVariables {
        async fn list_variables(
            &self,
            workspace: &WorkspaceId,
        ) -> Result<Vec<WorkspaceVariable>, RemoteError> {
            self.calls.lock().unwrap().push(workspace.clone());
            self.variables.clone().ok_or_else(|| RemoteError::Transport {
                url: "https://tfc.test/api/v2/workspaces/ws-1/vars".into(),
                message: "connection refused".into(),
            })
        }
    }

    struct RecordingSink {
        fail: bool,
        sent: Mutex<Vec<(CallbackTarget, TaskResult)>>,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<(CallbackTarget, TaskResult)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TaskResultSink for RecordingSink {
        async fn send_task_result(
            &self,
            target: &CallbackTarget,
            result: &TaskResult,
        ) -> Result<(), RemoteError> {
            self.sent
                .lock()
                .unwrap()
                .push((target.clone(), result.clone()));
            if self.fail {
                Err(RemoteError::UnexpectedStatus {
                    url: target.url.clone(),
                    status: 500,
                    body: "boom".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn payload(run: &str) -> InvocationPayload {
        InvocationPayload {
            run_id: RunId::new(run).unwrap(),
            workspace_id: WorkspaceId::new("ws-1").unwrap(),
            access_token: AccessToken::new("run-token"),
            task_result_callback_url: format!("https://tfc.test/callback/{run}"),
            ..InvocationPayload::default()
        }
    }

    fn job(payload: InvocationPayload) -> Job {
        Job {
            id: JobId::new_random(),
            enqueued_at: runtask::Timestamp::now(),
            payload,
        }
    }

    fn worker(
        variables: Arc<FakeVariables>,
        sink: Arc<RecordingSink>,
        lookup_failure: LookupFailurePolicy,
    ) -> Worker {
        let (_tx, rx) = JobQueue::bounded(1);
        Worker::new(
            rx,
            variables,
            sink,
            WorkerConfig {
                lookup_failure,
                ..WorkerConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn clean_workspace_reports_passed_with_run_token() {
        let variables = FakeVariables::with_keys(&["TF_LOG", "REGION"]);
        let sink = RecordingSink::new(false);
        let worker = worker(variables.clone(), sink.clone(), LookupFailurePolicy::FailOpen);

        let report = worker.process(job(payload("run-1"))).await;

        assert_eq!(report.lookup, LookupOutcome::Listed(2));
        assert!(report.found.is_empty());
        assert_eq!(report.result.status, TaskResultStatus::Passed);
        assert_eq!(report.delivery, DeliveryOutcome::Sent);

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.url, "https://tfc.test/callback/run-1");
        assert_eq!(sent[0].0.token.expose(), "run-token");
        assert_eq!(sent[0].1.status, TaskResultStatus::Passed);
    }

    #[tokio::test]
    async fn restricted_keys_report_failed_with_keys_in_order() {
        let variables =
            FakeVariables::with_keys(&["AWS_SECRET_ACCESS_KEY", "REGION", "AWS_SESSION_TOKEN"]);
        let sink = RecordingSink::new(false);
        let worker = worker(variables, sink.clone(), LookupFailurePolicy::FailOpen);

        let report = worker.process(job(payload("run-1"))).await;

        assert_eq!(report.found, vec!["AWS_SECRET_ACCESS_KEY", "AWS_SESSION_TOKEN"]);
        assert_eq!(report.result.status, TaskResultStatus::Failed);
        assert!(report
            .result
            .message
            .contains("AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN"));
        assert_eq!(sink.sent()[0].1, report.result);
    }

    #[tokio::test]
    async fn lookup_failure_fails_open_by_default() {
        let sink = RecordingSink::new(false);
        let worker = worker(FakeVariables::failing(), sink.clone(), LookupFailurePolicy::FailOpen);

        let report = worker.process(job(payload("run-1"))).await;

        assert!(matches!(report.lookup, LookupOutcome::Failed(ref m) if m.contains("connection refused")));
        assert_eq!(report.result.status, TaskResultStatus::Passed);
        assert_eq!(report.delivery, DeliveryOutcome::Sent);
    }

    #[tokio::test]
    async fn lookup_failure_can_fail_closed() {
        let sink = RecordingSink::new(false);
        let worker = worker(FakeVariables::failing(), sink.clone(), LookupFailurePolicy::FailClosed);

        let report = worker.process(job(payload("run-1"))).await;

        assert_eq!(report.result.status, TaskResultStatus::Failed);
        assert!(report.result.message.contains("connection refused"));
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn empty_workspace_id_skips_lookup() {
        let variables = FakeVariables::with_keys(&["AWS_ACCESS_KEY_ID"]);
        let sink = RecordingSink::new(false);
        let worker = worker(variables.clone(), sink.clone(), LookupFailurePolicy::FailOpen);

        let mut p = payload("run-1");
        p.workspace_id = WorkspaceId::default();
        let report = worker.process(job(p)).await;

        assert_eq!(variables.call_count(), 0);
        assert_eq!(report.lookup, LookupOutcome::Skipped);
        assert_eq!(report.result.status, TaskResultStatus::Passed);
    }

    #[tokio::test]
    async fn missing_callback_details_skip_delivery() {
        let sink = RecordingSink::new(false);
        let worker = worker(
            FakeVariables::with_keys(&[]),
            sink.clone(),
            LookupFailurePolicy::FailOpen,
        );

        let mut no_token = payload("run-1");
        no_token.access_token = AccessToken::default();
        let mut no_url = payload("run-2");
        no_url.task_result_callback_url.clear();

        assert_eq!(worker.process(job(no_token)).await.delivery, DeliveryOutcome::Skipped);
        assert_eq!(worker.process(job(no_url)).await.delivery, DeliveryOutcome::Skipped);
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn callback_failure_is_recorded_and_not_retried() {
        let sink = RecordingSink::new(true);
        let worker = worker(
            FakeVariables::with_keys(&[]),
            sink.clone(),
            LookupFailurePolicy::FailOpen,
        );

        let report = worker.process(job(payload("run-1"))).await;

        assert!(matches!(report.delivery, DeliveryOutcome::Failed(ref m) if m.contains("500")));
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_drains_in_order_and_paces_between_jobs() {
        let (tx, rx) = JobQueue::bounded(crate::JOB_QUEUE_CAPACITY);
        let sink = RecordingSink::new(false);
        let variables = FakeVariables::with_keys(&["REGION"]);
        let worker = Worker::new(rx, variables.clone(), sink.clone(), WorkerConfig::default());

        for run in ["run-a", "run-b", "run-c"] {
            tx.enqueue(payload(run)).await.unwrap();
        }
        drop(tx);

        let started = tokio::time::Instant::now();
        worker.run().await;

        assert!(started.elapsed() >= WORKER_PACE * 3);
        assert_eq!(variables.call_count(), 3);
        let sent = sink.sent();
        let urls: Vec<&str> = sent.iter().map(|(target, _)| target.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://tfc.test/callback/run-a",
                "https://tfc.test/callback/run-b",
                "https://tfc.test/callback/run-c",
            ]
        );
        assert!(sent
            .iter()
            .all(|(_, result)| result.status == TaskResultStatus::Passed));
    }

    #[tokio::test(start_paused = true)]
    async fn finish_waits_for_queued_jobs_within_grace() {
        let (tx, rx) = JobQueue::bounded(crate::JOB_QUEUE_CAPACITY);
        let sink = RecordingSink::new(false);
        let handle = Worker::new(rx, FakeVariables::with_keys(&[]), sink.clone(), WorkerConfig::default())
            .spawn();

        for run in ["run-a", "run-b"] {
            tx.enqueue(payload(run)).await.unwrap();
        }
        drop(tx);

        assert!(Worker::finish(handle, SHUTDOWN_GRACE).await);
        assert_eq!(sink.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_aborts_worker_that_outlives_grace() {
        let (tx, rx) = JobQueue::bounded(crate::JOB_QUEUE_CAPACITY);
        let sink = RecordingSink::new(false);
        let handle = Worker::new(rx, FakeVariables::with_keys(&[]), sink.clone(), WorkerConfig::default())
            .spawn();

        for run in 0..20 {
            tx.enqueue(payload(&format!("run-{run}"))).await.unwrap();
        }
        drop(tx);

        assert!(!Worker::finish(handle, WORKER_PACE * 5).await);
        let delivered = sink.sent().len();
        assert!(delivered < 20, "delivered {delivered}");

        tokio::time::sleep(WORKER_PACE * 30).await;
        assert_eq!(sink.sent().len(), delivered);
    }
}
