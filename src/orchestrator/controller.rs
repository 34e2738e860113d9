//! Plan session lifecycle controller.
//!
//! Owns submit-then-watch orchestration and emits events for presentation
//! layers.

use crate::error::PlanError;
use crate::model::{PlanEvent, SessionInput};
use crate::planner::{watch_job, PlannerClient, PollOutcome};
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// Submit one planning job and watch it to a terminal state.
///
/// Exactly one polling lifecycle runs per submission; a caller wanting a new
/// job calls this again, which implies a fresh handle. The cancel flag is
/// shared with the caller so teardown (Ctrl-C, navigation away) can stop the
/// watch deterministically; a poll resolving after cancellation is discarded
/// inside the watch and never surfaces as an event.
pub async fn run_plan_session(
    client: &PlannerClient,
    input: &SessionInput,
    event_tx: &UnboundedSender<PlanEvent>,
    cancel: Arc<AtomicBool>,
    poll_interval: Duration,
    poll_budget: Duration,
) -> Result<PollOutcome, PlanError> {
    let handle = client.start_plan(input).await?;
    info!(request_id = %handle.request_id, "planning job accepted");
    let _ = event_tx.send(PlanEvent::Submitted {
        request_id: handle.request_id.clone(),
    });

    let outcome = watch_job(client, &handle, event_tx, cancel, poll_interval, poll_budget).await?;

    match &outcome {
        PollOutcome::Completed(plan) => {
            let _ = event_tx.send(PlanEvent::Completed { plan: plan.clone() });
        }
        PollOutcome::Cancelled => {
            let _ = event_tx.send(PlanEvent::Info("Cancelled".into()));
        }
    }
    Ok(outcome)
}
