use std::fmt;

use crate::TransportErrorKind;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// Non-retryable HTTP status (4xx other than 429). Never retried.
    #[error("http error {status} on attempt {attempt}: {body}")]
    TerminalHttp {
        status: u16,
        /// Attempt number (1-based) that received the status.
        attempt: u32,
        /// Raw response body, lossily decoded as UTF-8.
        body: String,
    },
    /// A retryable condition persisted through the whole attempt budget.
    #[error("retries exhausted after {attempts} attempt(s), last failure was {last}: {message}")]
    RetriesExhausted {
        last: LastFailure,
        message: String,
        attempts: u32,
    },
    /// Transport failure that retrying cannot fix.
    #[error("non-retryable transport error ({kind}) on attempt {attempt}: {message}")]
    NonRetryableTransport {
        kind: TransportErrorKind,
        message: String,
        /// Attempt number (1-based) that raised the error.
        attempt: u32,
    },
    /// The request could not be built; no attempt was made.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The caller's own cancellation token fired.
    #[error("request cancelled by caller")]
    Cancelled,
    /// Response body decoding error.
    #[error("decode error: {0}")]
    Decode(String),
}

impl RetryError {
    /// HTTP status tied to the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TerminalHttp { status, .. } => Some(*status),
            Self::RetriesExhausted {
                last: LastFailure::Status(status),
                ..
            } => Some(*status),
            _ => None,
        }
    }

    /// Number of attempts made before the error surfaced, when known.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::TerminalHttp { attempt, .. } => Some(*attempt),
            Self::RetriesExhausted { attempts, .. } => Some(*attempts),
            Self::NonRetryableTransport { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }
}

/// Last retryable failure seen before the attempt budget ran out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LastFailure {
    Status(u16),
    Transport(TransportErrorKind),
}

impl fmt::Display for LastFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "status {status}"),
            Self::Transport(kind) => write!(f, "{kind}"),
        }
    }
}
