use std::fmt;

use chrono::Utc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    classify::{classify, AttemptResult},
    delay::DelayPlanner,
    runner::run_attempt,
    LastFailure, RequestSpec, ReqwestTransport, Response, Result, RetryError, Transport,
};

/// Sends a request with the default `reqwest` transport, retrying transient
/// failures as configured in `spec`.
pub async fn execute_with_retry(spec: &RequestSpec) -> Result<Response> {
    RetryExecutor::new().execute_with_retry(spec).await
}

/// Runs the attempt loop for a [`RequestSpec`] over a pluggable [`Transport`].
///
/// The executor holds no per-call state, so one instance can serve any
/// number of concurrent calls.
#[derive(Clone, Default)]
pub struct RetryExecutor<T = ReqwestTransport> {
    transport: T,
}

impl<T: fmt::Debug> fmt::Debug for RetryExecutor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("transport", &self.transport)
            .finish()
    }
}

impl RetryExecutor<ReqwestTransport> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Transport> RetryExecutor<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `spec`, retrying 429/5xx responses and timeout/network failures
    /// until a response is accepted or the attempt budget is spent.
    ///
    /// At most `max_attempts` transport calls are made, strictly one after
    /// another. Terminal statuses and non-retryable transport errors return
    /// immediately.
    pub async fn execute_with_retry(&self, spec: &RequestSpec) -> Result<Response> {
        let budget = spec.options().attempt_budget();
        let planner = DelayPlanner::new(spec.options().base_delay());
        let mut attempt = 1u32;

        loop {
            let outcome = classify(run_attempt(&self.transport, spec, attempt).await);

            let (last, message, retry_after) = match outcome {
                AttemptResult::Success(response) => return Ok(response),
                AttemptResult::Terminal { status, body } => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, status = status.as_u16(), "terminal http status");

                    return Err(RetryError::TerminalHttp {
                        status: status.as_u16(),
                        attempt,
                        body,
                    });
                }
                AttemptResult::TransportFailure {
                    error,
                    retryable: false,
                } => {
                    return Err(RetryError::NonRetryableTransport {
                        kind: error.kind,
                        message: error.message,
                        attempt,
                    });
                }
                AttemptResult::TransportFailure {
                    error,
                    retryable: true,
                } => (LastFailure::Transport(error.kind), error.message, None),
                AttemptResult::ServerRetryable {
                    status,
                    retry_after,
                } => (
                    LastFailure::Status(status.as_u16()),
                    format!("server responded with {status}"),
                    retry_after,
                ),
            };

            if attempt >= budget {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempts = attempt, last = %last, "retries exhausted");

                return Err(RetryError::RetriesExhausted {
                    last,
                    message,
                    attempts: attempt,
                });
            }

            let delay = planner.next_delay(
                attempt,
                retry_after.as_deref(),
                Utc::now(),
                &mut rand::thread_rng(),
            );

            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                cause = %last,
                "retrying request"
            );

            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Like [`execute_with_retry`](Self::execute_with_retry), but gives up with
    /// [`RetryError::Cancelled`] as soon as `cancel` fires. The in-flight
    /// attempt, if any, is cancelled with it.
    pub async fn execute_cancellable(
        &self,
        spec: &RequestSpec,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RetryError::Cancelled),
            result = self.execute_with_retry(spec) => result,
        }
    }
}
