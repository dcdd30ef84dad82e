//! credguard job queue and worker.
//!
//! The ingestion endpoint hands each accepted payload to a [`JobSender`]; a
//! single [`Worker`] drains the matching [`JobReceiver`], lists the workspace's
//! variables, applies the credential policy from the [`runtask`] crate, and
//! reports the verdict to the platform.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The worker sequences calls between the policy in
//! [`runtask`] and the [`runtask::VariableSource`] / [`runtask::TaskResultSink`]
//! ports. It contains no policy rules of its own and knows nothing about HTTP.

pub mod queue;
pub mod worker;

pub use queue::{Job, JobQueue, JobReceiver, JobSender, QueueError, JOB_QUEUE_CAPACITY};
pub use worker::{
    DeliveryOutcome, JobReport, LookupOutcome, Worker, WorkerConfig, SHUTDOWN_GRACE, WORKER_PACE,
};
