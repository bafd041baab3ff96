//! Bounded worker pool for render jobs.
//!
//! One queue serves one phase: the orchestrator starts it, the walker
//! submits into it, and [`JobQueue::drain`] closes it and waits for every
//! job to finish. Draining consumes the queue, so it cannot happen twice and
//! a drained queue cannot accept more work.
//!
//! ```text
//! walker ──submit──► bounded channel ──► worker 0 ─┐
//!   (blocks when          (cap)      ──► worker 1 ─┼─► RunReport (locked)
//!    workers are busy)               ──► worker N ─┘
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{debug, error, trace, warn};

use crate::application::ApplicationError;
use crate::domain::{JobError, JobOutcome, Phase, RenderJob, RunReport};

/// What a worker runs for each job.
pub type JobHandler = Arc<dyn Fn(&RenderJob) -> Result<JobOutcome, JobError> + Send + Sync>;

/// Worker count used when none is configured.
pub fn default_workers() -> usize {
    num_cpus::get().max(1)
}

/// Fixed pool of worker threads fed by a bounded channel.
pub struct JobQueue {
    phase: Phase,
    sender: Option<Sender<RenderJob>>,
    workers: Vec<JoinHandle<()>>,
    report: Arc<Mutex<RunReport>>,
    started: Instant,
}

impl JobQueue {
    /// Spawn `workers` threads (at least one) running `handler`.
    ///
    /// `capacity` is the number of jobs that may wait in the channel; with 0
    /// every submit hands its job directly to an idle worker.
    pub fn start(
        phase: Phase,
        workers: usize,
        capacity: usize,
        handler: JobHandler,
    ) -> Result<Self, ApplicationError> {
        let workers = workers.max(1);
        let (sender, receiver) = bounded::<RenderJob>(capacity);
        let report = Arc::new(Mutex::new(RunReport::default()));

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let receiver = receiver.clone();
            let handler = Arc::clone(&handler);
            let report = Arc::clone(&report);

            let handle = thread::Builder::new()
                .name(format!("butler-{}-{}", phase, id))
                .spawn(move || worker_loop(phase, receiver, handler, report))
                .map_err(|e| ApplicationError::WorkerPoolFailed {
                    reason: format!("could not spawn worker {}: {}", id, e),
                })?;
            handles.push(handle);
        }

        debug!(%phase, workers, capacity, "Job queue started");

        Ok(Self {
            phase,
            sender: Some(sender),
            workers: handles,
            report,
            started: Instant::now(),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue a job, blocking while the channel is full.
    pub fn submit(&self, job: RenderJob) -> Result<(), ApplicationError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| ApplicationError::WorkerPoolFailed {
                reason: "queue already closed".into(),
            })?;

        trace!(path = %job.path().display(), "Submitting job");
        sender
            .send(job)
            .map_err(|e| ApplicationError::WorkerPoolFailed {
                reason: format!("no worker left to take {}", e.into_inner().path().display()),
            })
    }

    /// Close submission, wait for every queued and running job, and return
    /// what they did.
    pub fn drain(mut self) -> RunReport {
        self.shutdown();

        let mut report = match Arc::try_unwrap(std::mem::take(&mut self.report)) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        };
        report.elapsed = self.started.elapsed();

        debug!(
            phase = %self.phase,
            succeeded = report.succeeded,
            failed = report.failed(),
            "Job queue drained"
        );
        report
    }

    fn shutdown(&mut self) {
        // Dropping the last sender ends every worker's receive loop.
        self.sender.take();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!(phase = %self.phase, "Worker thread exited abnormally");
            }
        }
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    phase: Phase,
    receiver: Receiver<RenderJob>,
    handler: JobHandler,
    report: Arc<Mutex<RunReport>>,
) {
    for job in receiver.iter() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| handler(&job)))
            .unwrap_or_else(|payload| {
                Err(JobError::Internal {
                    message: panic_message(payload.as_ref()),
                })
            });

        let mut report = report.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(outcome) => {
                debug!(%phase, path = %job.path().display(), ?outcome, "Job finished");
                report.record(&outcome);
            }
            Err(err) => {
                error!(%phase, path = %job.path().display(), error = %err, "Job failed");
                report.record_failure(job.path(), phase, err);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}
