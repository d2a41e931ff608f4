use tokio_util::sync::CancellationToken;

use crate::{RequestSpec, Response, Transport, TransportError};

/// Runs attempt number `attempt` under its own deadline.
///
/// A fresh token is created for every attempt and cancelled on every exit
/// path, including when the caller drops this future. The deadline timer
/// lives inside this call and is gone when it returns.
pub(crate) async fn run_attempt<T: Transport>(
    transport: &T,
    spec: &RequestSpec,
    attempt: u32,
) -> Result<Response, TransportError> {
    let cancel = CancellationToken::new();
    let _release = cancel.clone().drop_guard();
    let timeout = spec.options().timeout();

    let send = transport.send(spec.to_transport_request(attempt), cancel.clone());
    match tokio::time::timeout(timeout, send).await {
        Ok(result) => result,
        Err(_elapsed) => {
            cancel.cancel();

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, timeout_ms = spec.options().timeout_ms, "attempt timed out");

            Err(TransportError::timeout(format!(
                "attempt {attempt} timed out after {} ms",
                spec.options().timeout_ms
            )))
        }
    }
}
