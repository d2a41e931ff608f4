use bytes::Bytes;
use reqwest::{header::HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::{Result, RetryError};

/// Fully buffered HTTP response returned by a transport.
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Looks up a header case-insensitively. Values that are not visible
    /// ASCII are reported as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|err| {
            RetryError::Decode(format!("invalid response JSON: {err}; body: {}", self.text()))
        })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{
        header::{HeaderMap, HeaderValue, RETRY_AFTER},
        StatusCode,
    };

    use super::Response;
    use crate::RetryError;

    #[test]
    fn header_lookup_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));
        let response = Response::new(StatusCode::SERVICE_UNAVAILABLE, headers, "");

        assert_eq!(response.header("Retry-After"), Some("2"));
        assert_eq!(response.header("retry-after"), Some("2"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn json_decode_failure_is_decode_error() {
        let response = Response::new(StatusCode::OK, HeaderMap::new(), "not json");
        let err = response
            .json::<serde_json::Value>()
            .expect_err("body is not JSON");
        assert!(matches!(err, RetryError::Decode(_)));
    }
}
