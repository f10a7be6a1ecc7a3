//! Response builders shared by the handlers

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::{DumpError, Result};

/// Response type produced by every handler
pub type HttpResponse = Response<Full<Bytes>>;

const TEXT_PLAIN: &str = "text/plain; charset=UTF-8";
const APPLICATION_JSON: &str = "application/json";

/// Build a response with a body and content type
#[must_use]
pub fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> HttpResponse {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Create a plain-text response
#[must_use]
pub fn text(status: StatusCode, body: impl Into<String>) -> HttpResponse {
    with_body(status, TEXT_PLAIN, Bytes::from(body.into()))
}

/// Serialize a value into a JSON response
///
/// # Errors
///
/// Returns error if the value cannot be serialized
pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<HttpResponse> {
    let body = serde_json::to_vec(value)?;
    Ok(with_body(status, APPLICATION_JSON, Bytes::from(body)))
}

/// JSON error body for unmatched API routes
#[must_use]
pub fn not_found_json() -> HttpResponse {
    with_body(
        StatusCode::NOT_FOUND,
        APPLICATION_JSON,
        Bytes::from_static(br#"{"message":"Not Found"}"#),
    )
}

/// 405 with an `Allow` header listing the accepted methods
#[must_use]
pub fn method_not_allowed(allow: &'static str) -> HttpResponse {
    let mut response = text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}

/// Map an error to the response reported to the caller
#[must_use]
pub fn error_response(error: &DumpError) -> HttpResponse {
    match error {
        DumpError::InvalidBucketId => text(StatusCode::BAD_REQUEST, error.to_string()),
        DumpError::BodyRead(message) => text(StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        _ => {
            error!("Request failed: {}", error);
            text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}
