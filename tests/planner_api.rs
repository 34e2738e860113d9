//! HTTP-level tests for the planner client and its polling loop, against a
//! mock planning service.

use date_plan_cli::error::PlanError;
use date_plan_cli::model::{
    ClientConfig, DateContext, DateDuration, DateKind, JobHandle, JobStatus, PlanEvent,
    ProfileEntry, SessionInput, TimeOfDay,
};
use date_plan_cli::orchestrator::run_plan_session;
use date_plan_cli::planner::{watch_job, PlannerClient, PollOutcome};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FAST_INTERVAL: Duration = Duration::from_millis(10);
const TEST_BUDGET: Duration = Duration::from_secs(5);

fn client_for(server: &MockServer) -> PlannerClient {
    PlannerClient::new(&ClientConfig {
        base_url: server.uri(),
        poll_interval: FAST_INTERVAL,
        poll_budget: TEST_BUDGET,
        request_timeout: Duration::from_secs(5),
        user_agent: "date-plan-cli/test".into(),
    })
    .expect("client")
}

fn sample_input() -> SessionInput {
    SessionInput {
        profile_a: Some(ProfileEntry::from_text(
            "28F Amsterdam local, museum hopper by day, karaoke queen by night.",
        )),
        profile_b: Some(ProfileEntry::from_text(
            "30M foodie who knows every hidden restaurant along the canals.",
        )),
        context: Some(DateContext {
            location: "amsterdam".into(),
            time_of_day: TimeOfDay::Afternoon,
            duration: DateDuration::Hours6To8,
            date_type: DateKind::First,
        }),
    }
}

fn progress_body(status: &str, progress: u32) -> serde_json::Value {
    json!({
        "status": status,
        "overall_progress": progress,
        "current_step": progress / 25 + 1,
        "steps": {},
        "cultural_previews": [],
        "final_results_available": false
    })
}

#[tokio::test]
async fn submit_returns_the_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/start-cultural-date-plan"))
        .and(body_partial_json(json!({
            "context": {"location": "amsterdam", "duration": "6-8"}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "request_id": "abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let handle = client_for(&server)
        .start_plan(&sample_input())
        .await
        .expect("submission should succeed");
    assert_eq!(handle, JobHandle { request_id: "abc".into() });
}

#[tokio::test]
async fn submit_surfaces_the_server_reason_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/start-cultural-date-plan"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": "bad input"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .start_plan(&sample_input())
        .await
        .expect_err("success=false must fail");
    match err {
        PlanError::Submission(reason) => assert_eq!(reason, "bad input"),
        other => panic!("expected Submission, got {other:?}"),
    }
}

#[tokio::test]
async fn submit_fails_on_non_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/start-cultural-date-plan"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .start_plan(&sample_input())
        .await
        .expect_err("503 must fail");
    assert!(matches!(err, PlanError::Submission(_)));
}

#[tokio::test]
async fn overlong_profile_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    // No mock mounted: any request would 404 and, more importantly, show up
    // in received_requests below.

    let mut input = sample_input();
    input.profile_a = Some(ProfileEntry::from_text("x".repeat(201)));

    let err = client_for(&server)
        .start_plan(&input)
        .await
        .expect_err("201 chars must fail");
    assert!(matches!(err, PlanError::Submission(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn watch_reports_the_embedded_plan_exactly_once() {
    let server = MockServer::start().await;
    let plan = json!({"complete_date_plan": {"final_date_plan": {"date": {"theme": "art"}}}});

    // Successive polls walk pending -> in_progress -> complete; each mock is
    // consumed once, in mount order.
    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(progress_body("pending", 0)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(progress_body("in_progress", 50)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "complete",
            "overall_progress": 100,
            "current_step": 5,
            "steps": {},
            "cultural_previews": ["Finalizing your perfect date..."],
            "final_results_available": true,
            "final_date_plan_embedded": plan
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handle = JobHandle { request_id: "abc".into() };
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let outcome = watch_job(&client, &handle, &evt_tx, cancel, FAST_INTERVAL, TEST_BUDGET)
        .await
        .expect("watch should complete");
    let completed = match outcome {
        PollOutcome::Completed(p) => p,
        PollOutcome::Cancelled => panic!("unexpected cancellation"),
    };
    assert_eq!(
        completed["complete_date_plan"]["final_date_plan"]["date"]["theme"],
        "art"
    );

    // Exactly three snapshots, in response order, and only three polls hit
    // the server (the loop stopped at the terminal state).
    drop(evt_tx);
    let mut progress_seen = Vec::new();
    while let Some(ev) = evt_rx.recv().await {
        if let PlanEvent::Snapshot { snapshot } = ev {
            progress_seen.push(snapshot.overall_progress);
        }
    }
    assert_eq!(progress_seen, vec![0, 50, 100]);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn remote_error_status_stops_the_loop_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(progress_body("error", 40)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handle = JobHandle { request_id: "abc".into() };
    let (evt_tx, _evt_rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let err = watch_job(&client, &handle, &evt_tx, cancel, FAST_INTERVAL, TEST_BUDGET)
        .await
        .expect_err("error status must fail");
    assert!(matches!(err, PlanError::RemoteJob(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn transport_failure_during_polling_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handle = JobHandle { request_id: "abc".into() };
    let (evt_tx, _evt_rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let err = watch_job(&client, &handle, &evt_tx, cancel, FAST_INTERVAL, TEST_BUDGET)
        .await
        .expect_err("502 must fail");
    assert!(matches!(err, PlanError::Poll(_)));
    // No automatic retry of the poll call.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn stalled_job_times_out_at_the_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(progress_body("pending", 5)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handle = JobHandle { request_id: "abc".into() };
    let (evt_tx, _evt_rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let budget = Duration::from_millis(80);
    let err = watch_job(&client, &handle, &evt_tx, cancel, FAST_INTERVAL, budget)
        .await
        .expect_err("stalled job must time out");
    assert!(matches!(err, PlanError::Timeout(d) if d == budget));
}

#[tokio::test]
async fn late_response_after_cancellation_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(progress_body("in_progress", 30))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handle = JobHandle { request_id: "abc".into() };
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let watch_cancel = cancel.clone();
    let task = tokio::spawn(async move {
        watch_job(&client, &handle, &evt_tx, watch_cancel, FAST_INTERVAL, TEST_BUDGET).await
    });

    // Cancel while the first poll is still in flight.
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.store(true, Ordering::Relaxed);

    let outcome = task.await.expect("join").expect("watch result");
    assert!(matches!(outcome, PollOutcome::Cancelled));

    // The response eventually resolved on the server side, but no snapshot
    // may have been published.
    while let Some(ev) = evt_rx.recv().await {
        assert!(
            !matches!(ev, PlanEvent::Snapshot { .. }),
            "snapshot published after cancellation"
        );
    }
}

#[tokio::test]
async fn complete_without_embedded_plan_keeps_polling() {
    let server = MockServer::start().await;
    let plan = json!({"date": {"theme": "late night food crawl"}});

    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "complete",
            "overall_progress": 100,
            "current_step": 5,
            "final_results_available": false
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "complete",
            "overall_progress": 100,
            "current_step": 5,
            "final_results_available": true,
            "final_date_plan_embedded": plan
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handle = JobHandle { request_id: "abc".into() };
    let (evt_tx, _evt_rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let outcome = watch_job(&client, &handle, &evt_tx, cancel, FAST_INTERVAL, TEST_BUDGET)
        .await
        .expect("second poll should complete");
    assert!(matches!(outcome, PollOutcome::Completed(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn end_to_end_session_delivers_exactly_one_completion() {
    let server = MockServer::start().await;
    let plan = json!({
        "complete_date_plan": {"final_date_plan": {"date": {
            "theme": "art and canals",
            "activities": [{"name": "Rijksmuseum", "time_slot": "14:00-16:00"}]
        }}}
    });

    Mock::given(method("POST"))
        .and(path("/start-cultural-date-plan"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "request_id": "abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(progress_body("pending", 0)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(progress_body("in_progress", 50)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/date-plan-progress/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "complete",
            "overall_progress": 100,
            "current_step": 5,
            "final_results_available": true,
            "final_date_plan_embedded": plan
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let outcome = run_plan_session(
        &client,
        &sample_input(),
        &evt_tx,
        cancel,
        FAST_INTERVAL,
        TEST_BUDGET,
    )
    .await
    .expect("session should complete");
    assert!(matches!(outcome, PollOutcome::Completed(_)));

    drop(evt_tx);
    let mut submitted = 0;
    let mut completions = 0;
    let mut last_status = None;
    while let Some(ev) = evt_rx.recv().await {
        match ev {
            PlanEvent::Submitted { request_id } => {
                submitted += 1;
                assert_eq!(request_id, "abc");
            }
            PlanEvent::Snapshot { snapshot } => last_status = Some(snapshot.status),
            PlanEvent::Completed { plan } => {
                completions += 1;
                assert_eq!(
                    plan["complete_date_plan"]["final_date_plan"]["date"]["theme"],
                    "art and canals"
                );
            }
            PlanEvent::Info(_) => {}
        }
    }
    assert_eq!(submitted, 1);
    assert_eq!(completions, 1);
    assert_eq!(last_status, Some(JobStatus::Complete));
}
