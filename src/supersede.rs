//! Latest-wins bookkeeping for callers that replace in-flight calls, such as
//! a search box issuing one call per query change.
//!
//! The executor never versions results. A caller keeps one [`LatestRequest`]
//! per logical input, starts every call with [`LatestRequest::begin`], and
//! drops results whose ticket is no longer current.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct LatestRequest {
    latest: Arc<AtomicU64>,
    current: Option<CancellationToken>,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersedes the previous call, cancelling its token, and returns the
    /// ticket for a new one.
    pub fn begin(&mut self) -> RequestTicket {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        let version = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        RequestTicket {
            version,
            token,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Cancels the in-flight call, if any, without starting a new one.
    pub fn cancel(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    pub fn latest_version(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

/// Handle for one call started through [`LatestRequest::begin`].
#[derive(Clone, Debug)]
pub struct RequestTicket {
    version: u64,
    token: CancellationToken,
    latest: Arc<AtomicU64>,
}

impl RequestTicket {
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Call-level token; pass it to
    /// [`RetryExecutor::execute_cancellable`](crate::RetryExecutor::execute_cancellable).
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// `false` once a newer call was started or the call was cancelled.
    pub fn is_current(&self) -> bool {
        !self.token.is_cancelled() && self.latest.load(Ordering::SeqCst) == self.version
    }
}

#[cfg(test)]
mod tests {
    use super::LatestRequest;

    #[test]
    fn newer_ticket_supersedes_older() {
        let mut latest = LatestRequest::new();
        let first = latest.begin();
        assert!(first.is_current());

        let second = latest.begin();
        assert!(second.version() > first.version());
        assert!(first.token().is_cancelled());
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(!second.token().is_cancelled());
    }

    #[test]
    fn cancel_invalidates_without_new_ticket() {
        let mut latest = LatestRequest::new();
        let ticket = latest.begin();
        latest.cancel();
        assert!(ticket.token().is_cancelled());
        assert!(!ticket.is_current());
        assert_eq!(latest.latest_version(), 2);
    }
}
