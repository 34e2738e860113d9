//! Polling loop for a submitted planning job.
//!
//! Single cooperative loop: one GET per tick, the next tick only after the
//! previous response has been fully processed, so requests never pile up
//! behind a slow network. Cancellation is a shared flag checked before every
//! tick and re-checked after every response; a response that lands after
//! cancellation is discarded without touching any state.

use crate::error::PlanError;
use crate::model::{JobHandle, JobStatus, PlanEvent};
use crate::planner::PlannerClient;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// How a watch ended when it did not fail.
#[derive(Debug)]
pub enum PollOutcome {
    /// The job reached `complete` with its final plan embedded. Reported
    /// exactly once per watch.
    Completed(Box<serde_json::Value>),
    /// The consumer tore the watch down before the job finished.
    Cancelled,
}

/// Poll a job to completion on a fixed interval.
///
/// Every snapshot is forwarded wholesale, in strict response order, via
/// `event_tx`. The loop ends on: completion with an embedded plan, a service
/// side `error` status ([`PlanError::RemoteJob`]), a transport failure
/// ([`PlanError::Poll`], no automatic retry), an exhausted wall-clock budget
/// ([`PlanError::Timeout`]), or cancellation. All exits release the timer.
pub async fn watch_job(
    client: &PlannerClient,
    handle: &JobHandle,
    event_tx: &mpsc::UnboundedSender<PlanEvent>,
    cancel: Arc<AtomicBool>,
    interval: Duration,
    budget: Duration,
) -> Result<PollOutcome, PlanError> {
    let deadline = Instant::now() + budget;
    let mut ticker = tokio::time::interval(interval);
    // A slow response must delay the next tick, not trigger a burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if cancel.load(Ordering::Relaxed) {
            debug!(request_id = %handle.request_id, "watch cancelled before tick");
            return Ok(PollOutcome::Cancelled);
        }
        ticker.tick().await;
        if cancel.load(Ordering::Relaxed) {
            return Ok(PollOutcome::Cancelled);
        }
        if Instant::now() >= deadline {
            return Err(PlanError::Timeout(budget));
        }

        let snapshot = client.fetch_progress(handle).await?;

        // The response may have raced a cancellation; discard it rather than
        // publishing a stale update.
        if cancel.load(Ordering::Relaxed) {
            debug!(request_id = %handle.request_id, "late response discarded");
            return Ok(PollOutcome::Cancelled);
        }

        let status = snapshot.status;
        let final_result = snapshot.final_result.clone();
        let _ = event_tx.send(PlanEvent::Snapshot { snapshot });

        match status {
            JobStatus::Complete => {
                if let Some(plan) = final_result {
                    return Ok(PollOutcome::Completed(Box::new(plan)));
                }
                // Complete without an embedded plan: the service has not
                // materialized the result yet, keep polling inside the
                // budget.
                debug!(request_id = %handle.request_id, "complete without final plan, continuing");
            }
            JobStatus::Error => {
                return Err(PlanError::RemoteJob(format!(
                    "job {} failed on the service side",
                    handle.request_id
                )));
            }
            JobStatus::Pending | JobStatus::InProgress => {}
        }
    }
}
