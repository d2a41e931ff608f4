//! Pluggable transport seam between the retry loop and the HTTP client.
//!
//! The default [`ReqwestTransport`] is backed by `reqwest`. Tests and callers
//! with their own client can supply any [`Transport`], or wrap a closure with
//! [`transport_fn`].

use std::{error::Error as StdError, fmt, future::Future};

use bytes::Bytes;
use reqwest::{header::HeaderMap, Method};
use tokio_util::sync::CancellationToken;

use crate::Response;

/// One attempt's worth of request data handed to a transport.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// 1-based attempt index.
    pub attempt: u32,
}

/// Sends a single request and buffers the response.
///
/// `cancel` belongs to this attempt alone. Implementations should stop work
/// promptly once it fires; the attempt runner also drops the returned future
/// when the attempt times out.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: TransportRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;
}

/// Broad category of a transport failure. Decides retry eligibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Attempt deadline elapsed, or the attempt's token was cancelled.
    Timeout,
    /// Connection, request or body I/O failure.
    Network,
    /// Request could not be built (bad URL, bad header, ...).
    InvalidRequest,
    /// Anything else, including caller bugs surfaced through the transport.
    Other,
}

impl TransportErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Timeout | Self::Network)
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::InvalidRequest => "invalid request",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Failure raised by a [`Transport`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_builder() {
            TransportErrorKind::InvalidRequest
        } else if err.is_connect() || err.is_request() || err.is_body() {
            TransportErrorKind::Network
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, error_chain(&err))
    }
}

// reqwest's top-level message rarely names the cause ("error sending request").
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Default transport backed by a `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (proxies, TLS roots, default headers).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: TransportRequest,
        cancel: CancellationToken,
    ) -> Result<Response, TransportError> {
        let mut builder = self
            .http
            .request(request.method, request.url.as_str())
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(Response::new(status, headers, body))
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(TransportError::timeout(format!(
                "attempt {} cancelled before the response completed",
                request.attempt
            ))),
            result = exchange => result.map_err(TransportError::from),
        }
    }
}

/// Transport built from a closure. See [`transport_fn`].
#[derive(Clone)]
pub struct FnTransport<F> {
    send: F,
}

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}

/// Adapts `Fn(TransportRequest, CancellationToken) -> impl Future` into a
/// [`Transport`].
pub fn transport_fn<F, Fut>(send: F) -> FnTransport<F>
where
    F: Fn(TransportRequest, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, TransportError>> + Send,
{
    FnTransport { send }
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(TransportRequest, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, TransportError>> + Send,
{
    fn send(
        &self,
        request: TransportRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send {
        (self.send)(request, cancel)
    }
}
