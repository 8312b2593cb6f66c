//! Bounded-concurrency batch runner.
//!
//! ## Admission policies
//!
//! ```text
//! BatchBarrier (default)          SlidingWindow
//! ┌─ batch 0 ─┐ ┌─ batch 1 ─┐     worker 0: job0 ─ job3 ─ job4
//! │ j0 j1 j2  │→│ j3 j4 j5  │     worker 1: job1 ─ job2 ─ job5
//! └─ join ────┘ └─ join ────┘
//! ```
//!
//! Barrier mode spawns one OS thread per job and joins the whole batch before
//! admitting the next one, so a fast job idles its slot until the slowest
//! sibling finishes. Sliding mode keeps `budget` workers pulling from a shared
//! queue. Jobs share no mutable state; a failing or panicking job is recorded
//! in its `JobReport` and never cancels its siblings. There is no timeout: a
//! hung job blocks its batch.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{error, info, info_span};

pub use crate::config::AdmissionPolicy;
use crate::{
    config::RedactConfig,
    error::{RedactError, Result},
    redact::{ProcessedSegment, RedactJob, Redactor},
};

/// Broadcast capacity; slow subscribers lag rather than block jobs.
const BROADCAST_CAP: usize = 1024;

/// Progress notifications, one stream per orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    BatchStarted { batch: usize, jobs: usize },
    BatchFinished { batch: usize },
    JobStarted { index: usize, batch: Option<usize> },
    JobFinished { index: usize, ok: bool },
}

/// Outcome of one job.
#[derive(Debug)]
pub struct JobReport<T> {
    /// Position of the job in the input order.
    pub index: usize,
    /// Barrier batch number; `None` in sliding mode.
    pub batch: Option<usize>,
    pub started_at: Instant,
    pub finished_at: Instant,
    pub result: Result<T>,
}

impl<T> JobReport<T> {
    pub fn elapsed(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct BatchOrchestrator {
    budget: usize,
    policy: AdmissionPolicy,
    events_tx: broadcast::Sender<BatchEvent>,
}

impl BatchOrchestrator {
    pub fn new(budget: usize, policy: AdmissionPolicy) -> Self {
        let (events_tx, _) = broadcast::channel(BROADCAST_CAP);
        Self {
            budget: budget.max(1),
            policy,
            events_tx,
        }
    }

    pub fn from_config(config: &RedactConfig) -> Self {
        Self::new(config.max_concurrent_jobs, config.admission_policy)
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Subscribe to job / batch progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.events_tx.subscribe()
    }

    /// Run `job_fn` over every job under the budget.
    ///
    /// Jobs are admitted in input order. Reports come back sorted by index.
    pub fn run<J, T, F>(&self, jobs: Vec<J>, job_fn: F) -> Vec<JobReport<T>>
    where
        J: Send,
        T: Send,
        F: Fn(usize, J) -> Result<T> + Sync,
    {
        let total = jobs.len();
        info!(
            jobs = total,
            budget = self.budget,
            policy = ?self.policy,
            "batch run starting"
        );

        let mut reports = match self.policy {
            AdmissionPolicy::BatchBarrier => self.run_barrier(jobs, &job_fn),
            AdmissionPolicy::SlidingWindow => self.run_sliding(jobs, &job_fn),
        };
        reports.sort_by_key(|r| r.index);

        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        info!(jobs = total, failed, "batch run finished");
        reports
    }

    /// Run `Redactor::process_file` for every job.
    pub fn run_redactions(
        &self,
        redactor: &Redactor,
        jobs: Vec<RedactJob>,
    ) -> Vec<JobReport<ProcessedSegment>> {
        self.run(jobs, |_, job| redactor.process_file(&job))
    }

    fn run_barrier<J, T, F>(&self, jobs: Vec<J>, job_fn: &F) -> Vec<JobReport<T>>
    where
        J: Send,
        T: Send,
        F: Fn(usize, J) -> Result<T> + Sync,
    {
        let mut reports = Vec::with_capacity(jobs.len());
        let mut queue = jobs.into_iter().enumerate().peekable();
        let mut batch = 0usize;

        while queue.peek().is_some() {
            let admitted: Vec<(usize, J)> = queue.by_ref().take(self.budget).collect();
            let _ = self.events_tx.send(BatchEvent::BatchStarted {
                batch,
                jobs: admitted.len(),
            });
            info!(batch, jobs = admitted.len(), "batch admitted");

            let batch_reports = thread::scope(|s| {
                let mut handles = Vec::with_capacity(admitted.len());
                let mut spawn_failures = Vec::new();
                for (index, job) in admitted {
                    let events_tx = &self.events_tx;
                    let spawned = thread::Builder::new()
                        .name(format!("hushword-job-{index}"))
                        .spawn_scoped(s, move || {
                            execute(index, Some(batch), job, job_fn, events_tx)
                        });
                    match spawned {
                        Ok(handle) => handles.push((index, handle)),
                        Err(e) => {
                            error!(index, error = %e, "failed to spawn job thread");
                            spawn_failures.push(failed_report(index, Some(batch), e.into()));
                        }
                    }
                }

                // Barrier: every job in this batch terminates before the next is admitted.
                let mut done: Vec<JobReport<T>> = handles
                    .into_iter()
                    .map(|(index, handle)| {
                        handle.join().unwrap_or_else(|_| {
                            failed_report(
                                index,
                                Some(batch),
                                RedactError::JobPanicked("thread join failed".into()),
                            )
                        })
                    })
                    .collect();
                done.extend(spawn_failures);
                done
            });

            reports.extend(batch_reports);
            let _ = self.events_tx.send(BatchEvent::BatchFinished { batch });
            batch += 1;
        }

        reports
    }

    fn run_sliding<J, T, F>(&self, jobs: Vec<J>, job_fn: &F) -> Vec<JobReport<T>>
    where
        J: Send,
        T: Send,
        F: Fn(usize, J) -> Result<T> + Sync,
    {
        let total = jobs.len();
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, J)>();
        for entry in jobs.into_iter().enumerate() {
            // Receiver is alive until the scope below ends.
            let _ = job_tx.send(entry);
        }
        drop(job_tx);

        let reports: Mutex<Vec<JobReport<T>>> = Mutex::new(Vec::with_capacity(total));
        let workers = self.budget.min(total);

        thread::scope(|s| {
            for worker in 0..workers {
                let job_rx = job_rx.clone();
                let reports = &reports;
                let events_tx = &self.events_tx;
                let spawned = thread::Builder::new()
                    .name(format!("hushword-worker-{worker}"))
                    .spawn_scoped(s, move || {
                        for (index, job) in job_rx.iter() {
                            let report = execute(index, None, job, job_fn, events_tx);
                            reports.lock().push(report);
                        }
                    });
                if let Err(e) = spawned {
                    error!(worker, error = %e, "failed to spawn worker thread");
                }
            }
        });

        let mut reports = reports.into_inner();
        // Anything left in the queue never found a worker.
        for (index, _) in job_rx.try_iter() {
            reports.push(failed_report(
                index,
                None,
                RedactError::Other(anyhow::anyhow!("no worker thread available")),
            ));
        }
        reports
    }
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("budget", &self.budget)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn execute<J, T, F>(
    index: usize,
    batch: Option<usize>,
    job: J,
    job_fn: &F,
    events_tx: &broadcast::Sender<BatchEvent>,
) -> JobReport<T>
where
    F: Fn(usize, J) -> Result<T>,
{
    let span = info_span!("job", index, batch = ?batch);
    let _enter = span.enter();

    let _ = events_tx.send(BatchEvent::JobStarted { index, batch });
    let started_at = Instant::now();

    let result = match catch_unwind(AssertUnwindSafe(|| job_fn(index, job))) {
        Ok(result) => result,
        Err(payload) => Err(RedactError::JobPanicked(panic_message(payload.as_ref()))),
    };

    let finished_at = Instant::now();
    if let Err(e) = &result {
        error!(error = %e, "job failed");
    }
    let _ = events_tx.send(BatchEvent::JobFinished {
        index,
        ok: result.is_ok(),
    });

    JobReport {
        index,
        batch,
        started_at,
        finished_at,
        result,
    }
}

fn failed_report<T>(index: usize, batch: Option<usize>, err: RedactError) -> JobReport<T> {
    let now = Instant::now();
    JobReport {
        index,
        batch,
        started_at: now,
        finished_at: now,
        result: Err(err),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
