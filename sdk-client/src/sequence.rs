//! Ordered multi-step execution without rollback.

use nimbus_sdk_core::classify_response;
use nimbus_sdk_types::{ClassifiedError, Request, Response};
use thiserror::Error;
use tracing::debug;

use crate::error::classify_transport;
use crate::transport::Transport;

/// A multi-step run that stopped early.
///
/// Steps already applied stay applied; `remaining` starts with the step
/// that failed, so resubmitting it resumes the run.
#[derive(Debug, Error)]
#[error("step {} of {} failed: {}", .applied.len() + 1, .applied.len() + .remaining.len(), .error)]
pub struct StepFailure {
    /// Responses of the steps that succeeded, in order.
    pub applied: Vec<Response>,
    /// The failed step followed by every step not attempted.
    pub remaining: Vec<Request>,
    /// Why the step failed.
    pub error: ClassifiedError,
}

/// Send `steps` one after another, stopping at the first failure.
pub async fn run_in_order<T: Transport + ?Sized>(
    transport: &T,
    steps: Vec<Request>,
) -> Result<Vec<Response>, StepFailure> {
    let mut applied = Vec::with_capacity(steps.len());
    let mut pending = steps.into_iter();

    while let Some(step) = pending.next() {
        debug!(step = applied.len() + 1, method = %step.method, url = %step.url, "running step");
        let outcome = transport.execute(step.clone()).await;
        let error = match outcome {
            Ok(response) if response.is_success() => {
                applied.push(response);
                continue;
            }
            Ok(response) => classify_response(response.status, &response.body),
            Err(e) => classify_transport(&e),
        };
        let mut remaining = vec![step];
        remaining.extend(pending);
        return Err(StepFailure {
            applied,
            remaining,
            error,
        });
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use nimbus_sdk_types::Method;
    use serde_json::json;

    fn steps(n: usize) -> Vec<Request> {
        (0..n)
            .map(|i| Request::new(Method::Post, format!("https://api.test/step/{i}")))
            .collect()
    }

    #[tokio::test]
    async fn all_steps_succeed() {
        let transport = MockTransport::new();
        for _ in 0..3 {
            transport.queue_json(200, json!({}));
        }
        let responses = run_in_order(&transport, steps(3)).await.unwrap();
        assert_eq!(responses.len(), 3);
    }

    #[tokio::test]
    async fn stops_at_first_failure_without_rollback() {
        let transport = MockTransport::new();
        transport.queue_json(200, json!({"n": 0}));
        transport.queue_json(400, json!({"errorCode": "INVALID_INPUT_DATA", "message": "bad"}));
        transport.queue_json(200, json!({"n": 2}));

        let failure = run_in_order(&transport, steps(3)).await.unwrap_err();

        assert_eq!(failure.applied.len(), 1);
        assert_eq!(failure.remaining.len(), 2);
        assert_eq!(failure.remaining[0].url, "https://api.test/step/1");
        assert_eq!(failure.error.status, 400);
        assert_eq!(failure.to_string(), "step 2 of 3 failed: 400: INVALID_INPUT_DATA: bad");
        // Only the first two steps reached the transport.
        assert_eq!(transport.sent_requests().len(), 2);
    }

    #[tokio::test]
    async fn transport_failure_stops_the_run() {
        let transport = MockTransport::new();
        transport.fail_next("reset");
        let failure = run_in_order(&transport, steps(2)).await.unwrap_err();
        assert!(failure.error.is_network());
        assert!(failure.applied.is_empty());
        assert_eq!(failure.remaining.len(), 2);
    }
}
