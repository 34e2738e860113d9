use crate::error::PlanError;
use crate::flow::{FlowController, Screen};
use crate::model::{
    ClientConfig, DateContext, DateDuration, DateKind, PlanEvent, ProfileEntry, SessionPatch,
    TimeOfDay,
};
use crate::orchestrator::{process_plan_completion, run_plan_session};
use crate::planner::{PlannerClient, PollOutcome};
use crate::progress::PreviewFilter;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for the stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "date-plan-cli",
    version,
    about = "Plan a date through the cultural planning service"
)]
pub struct Cli {
    /// Base URL of the planning service
    #[arg(long, default_value = "https://api.ai-more.me")]
    pub base_url: String,

    /// Free-text description of the first person (up to 200 characters)
    #[arg(long)]
    pub profile_a: String,

    /// Free-text description of the second person (up to 200 characters)
    #[arg(long)]
    pub profile_b: String,

    /// City or neighborhood for the date
    #[arg(long)]
    pub location: String,

    /// Preferred time of day
    #[arg(long, value_enum)]
    pub time_of_day: TimeOfDay,

    /// Date length in hours
    #[arg(long, value_enum)]
    pub duration: DateDuration,

    /// Kind of date being planned
    #[arg(long, value_enum)]
    pub date_type: DateKind,

    /// Print the raw plan JSON instead of a text summary
    #[arg(long)]
    pub json: bool,

    /// Interval between progress polls
    #[arg(long, default_value = "2s")]
    pub poll_interval: humantime::Duration,

    /// Give up if no terminal status arrives within this budget
    #[arg(long, default_value = "180s")]
    pub poll_budget: humantime::Duration,

    /// Export the finished plan as JSON
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,

    /// Use --auto-save true or --auto-save false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_save: bool,
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        poll_interval: Duration::from(args.poll_interval),
        poll_budget: Duration::from(args.poll_budget),
        request_timeout: Duration::from_secs(30),
        user_agent: format!("date-plan-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// Patches applied at each input screen, mirroring the product flow: profiles
/// on the profile screen, context on the customization screen.
fn profile_patch(args: &Cli) -> SessionPatch {
    SessionPatch {
        profile_a: Some(ProfileEntry::from_text(&args.profile_a)),
        profile_b: Some(ProfileEntry::from_text(&args.profile_b)),
        ..Default::default()
    }
}

fn context_patch(args: &Cli) -> SessionPatch {
    SessionPatch {
        context: Some(DateContext {
            location: args.location.clone(),
            time_of_day: args.time_of_day,
            duration: args.duration,
            date_type: args.date_type,
        }),
        ..Default::default()
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let client = PlannerClient::new(&cfg)?;
    let (out_tx, out_handle) = spawn_output_writer();

    // Walk the session through the same pipeline the product uses, collecting
    // input per screen. The controller owns everything the job needs.
    let mut flow = FlowController::new();
    flow.advance(); // Onboarding -> Profile
    flow.apply(profile_patch(&args));
    flow.advance(); // Profile -> Customization
    flow.apply(context_patch(&args));
    flow.advance(); // Customization -> Processing
    debug_assert_eq!(flow.screen(), Screen::Processing);

    let outcome = run_processing_screen(&args, &cfg, &client, &mut flow, &out_tx).await;

    let result = match outcome {
        Ok(PollOutcome::Completed(plan)) => {
            flow.advance(); // Processing -> Output
            render_output_screen(&args, &flow, &plan, &out_tx)
        }
        Ok(PollOutcome::Cancelled) => {
            let _ = out_tx.send(OutputLine::Stderr("Cancelled, no plan produced.".into()));
            flow.reset();
            Ok(())
        }
        Err(e) => Err(e),
    };

    drop(out_tx);
    let _ = out_handle.await;
    result
}

/// Drive the processing screen: submit, watch progress events, react to
/// Ctrl-C with deterministic cancellation.
async fn run_processing_screen(
    args: &Cli,
    cfg: &ClientConfig,
    client: &PlannerClient,
    flow: &mut FlowController,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<PollOutcome> {
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<PlanEvent>();
    let cancel = Arc::new(AtomicBool::new(false));

    let session_client = client.clone();
    let session_input = flow.session().clone();
    let session_cancel = cancel.clone();
    let poll_interval = cfg.poll_interval;
    let poll_budget = cfg.poll_budget;
    let mut session_task = tokio::spawn(async move {
        run_plan_session(
            &session_client,
            &session_input,
            &evt_tx,
            session_cancel,
            poll_interval,
            poll_budget,
        )
        .await
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    let mut events_open = true;
    let mut previews = PreviewFilter::new();

    let join_res = loop {
        tokio::select! {
            ev = evt_rx.recv(), if events_open => {
                match ev {
                    Some(ev) => handle_event(ev, flow, &mut previews, args.json, out_tx),
                    // Closed channel just means the task is wrapping up; the
                    // join branch below observes the result.
                    None => events_open = false,
                }
            }
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                cancel.store(true, Ordering::Relaxed);
                let _ = out_tx.send(OutputLine::Stderr("Cancelling…".into()));
            }
            res = &mut session_task => {
                break res;
            }
        }
    };

    // Drain events that were in flight when the task finished.
    while let Ok(ev) = evt_rx.try_recv() {
        handle_event(ev, flow, &mut previews, args.json, out_tx);
    }

    let outcome = join_res
        .context("plan session task failed")?
        .map_err(|e: PlanError| anyhow::Error::new(e))?;
    Ok(outcome)
}

fn handle_event(
    ev: PlanEvent,
    flow: &mut FlowController,
    previews: &mut PreviewFilter,
    json_mode: bool,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) {
    match ev {
        PlanEvent::Submitted { request_id } => {
            let _ = out_tx.send(OutputLine::Stderr(format!("Submitted job {request_id}")));
            flow.set_handle(crate::model::JobHandle { request_id });
        }
        PlanEvent::Snapshot { snapshot } => {
            for line in previews.filter(snapshot.step_previews.iter().map(String::as_str)) {
                let _ = out_tx.send(OutputLine::Stderr(format!("  {line}")));
            }
            // Steps are 1-indexed in the service contract.
            let step_name = snapshot
                .steps
                .get((snapshot.current_step as usize).saturating_sub(1))
                .map(|s| s.name.as_str());
            let line = match step_name {
                Some(name) => format!("Progress: {}% ({name})", snapshot.overall_progress),
                None => format!("Progress: {}%", snapshot.overall_progress),
            };
            let _ = out_tx.send(OutputLine::Stderr(line));
            flow.set_snapshot(snapshot);
        }
        // The watch outcome carries the plan; here it only marks the moment.
        PlanEvent::Completed { .. } => {
            if !json_mode {
                let _ = out_tx.send(OutputLine::Stderr("Plan ready.".into()));
            }
        }
        PlanEvent::Info(msg) => {
            let _ = out_tx.send(OutputLine::Stderr(msg));
        }
    }
}

/// Render the output screen: summary or raw JSON, plus auto-save/export.
fn render_output_screen(
    args: &Cli,
    flow: &FlowController,
    plan: &serde_json::Value,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    debug_assert_eq!(flow.screen(), Screen::Output);

    if args.json {
        let body = serde_json::to_string_pretty(plan)?;
        let _ = out_tx.send(OutputLine::Stdout(body));
    } else {
        for line in crate::text_summary::build_plan_summary(plan).lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    let processed = process_plan_completion(plan, args.auto_save, args.export_json.as_deref())?;
    if let Some(path) = processed.auto_saved_path {
        let _ = out_tx.send(OutputLine::Stderr(format!("Saved: {}", path.display())));
    }
    for msg in processed.export_messages {
        let _ = out_tx.send(OutputLine::Stderr(msg));
    }
    Ok(())
}
