use std::time::Duration;

use bytes::Bytes;

use crate::{Error, HttpTransportErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: http::Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get_owned(url: String) -> Self {
        Self {
            method: http::Method::GET,
            url,
            headers: Vec::new(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub kind: HttpTransportErrorKind,
    pub message: String,
}

impl From<&Error> for ProbeFailure {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.transport_error_kind(),
            message: err.to_string(),
        }
    }
}

/// Flattened outcome of a single probe: either a response or a transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub status: Option<u16>,
    pub body: Bytes,
    pub error: Option<ProbeFailure>,
}

impl ProbeResult {
    pub fn error_kind(&self) -> Option<HttpTransportErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

impl From<crate::Result<HttpResponse>> for ProbeResult {
    fn from(res: crate::Result<HttpResponse>) -> Self {
        match res {
            Ok(r) => Self {
                status: Some(r.status),
                body: r.body,
                error: None,
            },
            Err(err) => Self {
                status: None,
                body: Bytes::new(),
                error: Some(ProbeFailure::from(&err)),
            },
        }
    }
}
