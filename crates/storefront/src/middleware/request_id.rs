//! Per-request correlation IDs.
//!
//! An upstream `x-request-id` is kept when it is short visible ASCII;
//! anything else is replaced with a fresh UUID v4 so hostile or garbled
//! values never reach logs, Sentry tags, or response headers. Handlers can
//! read the ID through `Extension<RequestId>`.

use std::fmt;

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID kept as-is.
const MAX_LEN: usize = 128;

/// Correlation ID attached to a request and echoed on its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// A fresh random ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept an upstream value if it is 1..=128 printable ASCII characters.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let acceptable = !raw.is_empty()
            && raw.len() <= MAX_LEN
            && raw.bytes().all(|b| b.is_ascii_graphic());
        acceptable.then(|| Self(raw.to_owned()))
    }

    /// Upstream ID from `headers`, or a generated one.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_else(Self::generate)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assign a [`RequestId`], tag the span and Sentry scope with it, and echo it.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = RequestId::from_headers(request.headers());

    Span::current().record("request_id", id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", id.as_str()));
    request.extensions_mut().insert(id.clone());

    let mut response = next.run(request).await;
    // Visible ASCII always forms a valid header value
    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
