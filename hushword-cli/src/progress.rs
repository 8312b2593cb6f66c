//! Batch progress logging.

use hushword_core::BatchEvent;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, info};

/// Drain batch events until the orchestrator is dropped.
pub fn log_progress(mut rx: Receiver<BatchEvent>) {
    loop {
        match rx.blocking_recv() {
            Ok(BatchEvent::BatchStarted { batch, jobs }) => info!(batch, jobs, "batch started"),
            Ok(BatchEvent::BatchFinished { batch }) => info!(batch, "batch finished"),
            Ok(BatchEvent::JobStarted { index, batch }) => debug!(index, batch = ?batch, "job started"),
            Ok(BatchEvent::JobFinished { index, ok }) => debug!(index, ok, "job finished"),
            Err(RecvError::Lagged(n)) => debug!(skipped = n, "progress events dropped"),
            Err(RecvError::Closed) => break,
        }
    }
}
