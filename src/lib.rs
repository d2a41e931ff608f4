//! `resilient-http` sends an HTTP request and retries it when retrying can
//! help.
//!
//! One call to [`execute_with_retry`] (or [`RetryExecutor::execute_with_retry`]):
//! - runs at most [`RetryOptions::max_attempts`] attempts, one at a time,
//!   each bounded by its own timeout and cancellation token;
//! - retries 429/5xx responses and timeout/network failures;
//! - waits `base_delay * 2^(attempt-1)` with full jitter between attempts,
//!   or the server's `Retry-After` when it is usable;
//! - fails fast on other 4xx statuses and non-retryable transport errors.

mod classify;
mod delay;
mod error;
mod executor;
mod options;
mod request;
mod response;
mod runner;
mod supersede;
mod transport;

pub use classify::{classify, AttemptResult};
pub use delay::{full_jitter, DelayPlanner, RetryAfter};
pub use error::{LastFailure, RetryError};
pub use executor::{execute_with_retry, RetryExecutor};
pub use options::RetryOptions;
pub use request::RequestSpec;
pub use response::Response;
pub use supersede::{LatestRequest, RequestTicket};
pub use transport::{
    transport_fn, FnTransport, ReqwestTransport, Transport, TransportError, TransportErrorKind,
    TransportRequest,
};

pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, RetryError>;
