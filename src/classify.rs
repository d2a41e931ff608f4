use reqwest::{header::RETRY_AFTER, StatusCode};

use crate::{Response, TransportError};

/// Outcome of exactly one attempt.
#[derive(Debug)]
pub enum AttemptResult {
    Success(Response),
    /// 429 or 5xx. Carries the raw `Retry-After` value when the server sent one.
    ServerRetryable {
        status: StatusCode,
        retry_after: Option<String>,
    },
    /// Any other non-2xx status.
    Terminal { status: StatusCode, body: String },
    TransportFailure {
        error: TransportError,
        retryable: bool,
    },
}

impl AttemptResult {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ServerRetryable { .. } => true,
            Self::TransportFailure { retryable, .. } => *retryable,
            Self::Success(_) | Self::Terminal { .. } => false,
        }
    }
}

/// Maps a finished attempt to its retry category.
pub fn classify(result: Result<Response, TransportError>) -> AttemptResult {
    match result {
        Ok(response) => classify_response(response),
        Err(error) => {
            let retryable = error.is_retryable();
            AttemptResult::TransportFailure { error, retryable }
        }
    }
}

fn classify_response(response: Response) -> AttemptResult {
    let status = response.status();
    if status.is_success() {
        return AttemptResult::Success(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        return AttemptResult::ServerRetryable {
            status,
            retry_after,
        };
    }

    AttemptResult::Terminal {
        status,
        body: response.text(),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{
        header::{HeaderMap, HeaderValue, RETRY_AFTER},
        StatusCode,
    };

    use super::{classify, AttemptResult};
    use crate::{Response, TransportError, TransportErrorKind};

    fn response(status: u16) -> Response {
        Response::new(
            StatusCode::from_u16(status).expect("valid status"),
            HeaderMap::new(),
            "body",
        )
    }

    #[test]
    fn any_2xx_is_success() {
        for status in [200, 201, 204, 299] {
            assert!(matches!(
                classify(Ok(response(status))),
                AttemptResult::Success(_)
            ));
        }
    }

    #[test]
    fn rate_limit_and_server_errors_are_retryable() {
        for status in [429, 500, 502, 503, 504, 599] {
            let outcome = classify(Ok(response(status)));
            assert!(
                matches!(outcome, AttemptResult::ServerRetryable { .. }),
                "{status} must be retryable"
            );
        }
    }

    #[test]
    fn other_client_errors_are_terminal() {
        for status in [400, 401, 403, 404, 409, 422] {
            match classify(Ok(response(status))) {
                AttemptResult::Terminal { status: got, body } => {
                    assert_eq!(got.as_u16(), status);
                    assert_eq!(body, "body");
                }
                other => panic!("{status} must be terminal, got {other:?}"),
            }
        }
    }

    #[test]
    fn retry_after_header_is_carried_raw() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        let outcome = classify(Ok(Response::new(
            StatusCode::TOO_MANY_REQUESTS,
            headers,
            "",
        )));
        match outcome {
            AttemptResult::ServerRetryable { retry_after, .. } => {
                assert_eq!(retry_after.as_deref(), Some("Wed, 21 Oct 2015 07:28:00 GMT"));
            }
            other => panic!("expected retryable outcome, got {other:?}"),
        }
    }

    #[test]
    fn transport_errors_retry_only_for_timeout_and_network() {
        let cases = [
            (TransportErrorKind::Timeout, true),
            (TransportErrorKind::Network, true),
            (TransportErrorKind::InvalidRequest, false),
            (TransportErrorKind::Other, false),
        ];
        for (kind, expected) in cases {
            let outcome = classify(Err(TransportError::new(kind, "boom")));
            assert_eq!(outcome.is_retryable(), expected, "{kind}");
        }
    }
}
