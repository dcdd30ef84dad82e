//! Bounded FIFO of pending run task invocations.
//!
//! Many producers (one per inbound request) and exactly one consumer. A full
//! queue makes producers wait rather than fail, which keeps the request rate
//! seen by the platform bounded when callbacks slow down.

use runtask::{InvocationPayload, JobId, Timestamp};
use thiserror::Error;
use tokio::sync::mpsc;

/// Capacity of the production queue.
pub const JOB_QUEUE_CAPACITY: usize = 100;

/// One queued invocation.
#[derive(Debug)]
pub struct Job {
    pub id: JobId,
    pub enqueued_at: Timestamp,
    pub payload: InvocationPayload,
}

impl Job {
    fn new(payload: InvocationPayload) -> Self {
        Self {
            id: JobId::new_random(),
            enqueued_at: Timestamp::now(),
            payload,
        }
    }
}

#[derive(Debug, Error)]
pub enum QueueError {
    /// The receiving side is gone, so nothing would ever process the job.
    #[error("Job queue is closed; the worker is no longer running")]
    Closed,
}

/// Constructor for the sender/receiver pair.
pub struct JobQueue;

impl JobQueue {
    /// Creates a queue holding at most `capacity` pending jobs.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn bounded(capacity: usize) -> (JobSender, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (JobSender { tx }, JobReceiver { rx })
    }
}

/// Producer handle. Cheap to clone; one is handed to every request handler.
#[derive(Debug, Clone)]
pub struct JobSender {
    tx: mpsc::Sender<Job>,
}

impl JobSender {
    /// Places `payload` at the tail of the queue, waiting for space if full.
    pub async fn enqueue(&self, payload: InvocationPayload) -> Result<JobId, QueueError> {
        let job = Job::new(payload);
        let id = job.id;
        self.tx.send(job).await.map_err(|_| QueueError::Closed)?;
        Ok(id)
    }

    /// Number of jobs waiting to be picked up.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Fixed capacity the queue was created with.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer handle. Owned by the single worker.
#[derive(Debug)]
pub struct JobReceiver {
    rx: mpsc::Receiver<Job>,
}

impl JobReceiver {
    /// Removes the head of the queue, waiting while it is empty.
    ///
    /// Returns `None` once every [`JobSender`] has been dropped and the queue
    /// is drained.
    pub async fn next(&mut self) -> Option<Job> {
        self.rx.recv().await
    }
}
