use std::time::Duration;

/// Failure taxonomy for one planning attempt.
///
/// Every variant is terminal for the attempt: the polling loop stops and its
/// timer is released. None of these are retried automatically; the caller
/// decides whether to resubmit.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Job creation failed: transport error, non-2xx response, or the service
    /// answered `success: false`. Carries the server's reason verbatim when
    /// one was provided.
    #[error("submission failed: {0}")]
    Submission(String),

    /// Transport failure while polling an existing job. This is a poll
    /// failure, not necessarily a job failure, but it ends the loop.
    #[error("progress poll failed: {0}")]
    Poll(String),

    /// The service itself reported `status: error` for the job.
    #[error("remote planning job failed: {0}")]
    RemoteJob(String),

    /// Polling exceeded the wall-clock budget without reaching a terminal
    /// status.
    #[error("no result after {}; giving up", humantime::format_duration(*.0))]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_server_reason_verbatim() {
        let err = PlanError::Submission("bad input".into());
        assert_eq!(err.to_string(), "submission failed: bad input");
    }

    #[test]
    fn timeout_formats_budget() {
        let err = PlanError::Timeout(Duration::from_secs(180));
        assert_eq!(err.to_string(), "no result after 3m; giving up");
    }
}
