//! HTTP client for the remote planning service.
//!
//! Two endpoints are consumed: job creation and job progress. The planning
//! computation itself lives entirely on the service side; this module only
//! submits input and observes the job.

pub mod watch;

use crate::error::PlanError;
use crate::model::{
    ClientConfig, JobHandle, ProgressResponse, ProgressSnapshot, SessionInput, StartPlanRequest,
    StartPlanResponse, PROFILE_TEXT_MAX_CHARS,
};
use anyhow::{Context, Result};
use tracing::debug;

pub use watch::{watch_job, PollOutcome};

#[derive(Clone)]
pub struct PlannerClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
}

impl PlannerClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let base_url = reqwest::Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid base url: {}", cfg.base_url))?;
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, PlanError> {
        self.base_url
            .join(path)
            .map_err(|e| PlanError::Poll(format!("bad endpoint {path}: {e}")))
    }

    /// Submit a planning job. The returned handle is the sole key for all
    /// subsequent progress polls.
    ///
    /// Fails with [`PlanError::Submission`] on incomplete input, transport
    /// failure, a non-2xx response, or `success: false` in the body; the
    /// server's reason is surfaced verbatim when it gives one.
    pub async fn start_plan(&self, input: &SessionInput) -> Result<JobHandle, PlanError> {
        let (profile_a, profile_b, context) =
            match (&input.profile_a, &input.profile_b, &input.context) {
                (Some(a), Some(b), Some(c)) => (a, b, c),
                _ => {
                    return Err(PlanError::Submission(
                        "both profiles and the date context are required".into(),
                    ))
                }
            };
        for (label, profile) in [("profile_a", profile_a), ("profile_b", profile_b)] {
            let len = profile.text.chars().count();
            if len > PROFILE_TEXT_MAX_CHARS {
                return Err(PlanError::Submission(format!(
                    "{label} is {len} characters; the limit is {PROFILE_TEXT_MAX_CHARS}"
                )));
            }
        }

        let url = self
            .base_url
            .join("start-cultural-date-plan")
            .map_err(|e| PlanError::Submission(format!("bad endpoint: {e}")))?;
        let body = StartPlanRequest {
            profile_a,
            profile_b,
            context,
        };

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PlanError::Submission(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PlanError::Submission(format!(
                "service answered {status}"
            )));
        }

        let parsed: StartPlanResponse = resp
            .json()
            .await
            .map_err(|e| PlanError::Submission(format!("malformed response: {e}")))?;
        if !parsed.success {
            return Err(PlanError::Submission(
                parsed.error.unwrap_or_else(|| "unknown reason".into()),
            ));
        }
        let request_id = parsed.request_id.ok_or_else(|| {
            PlanError::Submission("service reported success without a request id".into())
        })?;

        debug!(%request_id, "planning job submitted");
        Ok(JobHandle { request_id })
    }

    /// Fetch the current progress of a job as a fresh snapshot. Non-2xx or a
    /// transport failure is a poll failure, which callers treat as fatal to
    /// the polling loop.
    pub async fn fetch_progress(&self, handle: &JobHandle) -> Result<ProgressSnapshot, PlanError> {
        let url = self.endpoint(&format!("date-plan-progress/{}", handle.request_id))?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PlanError::Poll(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PlanError::Poll(format!("service answered {status}")));
        }

        let parsed: ProgressResponse = resp
            .json()
            .await
            .map_err(|e| PlanError::Poll(format!("malformed progress body: {e}")))?;
        let snapshot = parsed.into_snapshot();
        debug!(
            request_id = %handle.request_id,
            status = ?snapshot.status,
            progress = snapshot.overall_progress,
            "progress poll"
        );
        Ok(snapshot)
    }
}
