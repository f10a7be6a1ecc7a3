//! Capture handler: turn one inbound request into a stored record

use std::fmt::Display;
use std::net::SocketAddr;

use http::request::Parts;
use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::header::HOST;
use hyper::{Request, StatusCode};
use tracing::debug;

use crate::store::{canonical_header_name, MultiMap, Record, RecordStore, RecordUrl};
use crate::{DumpError, Result};

use super::response::{self, HttpResponse};

/// Capture a request into `bucket_id` and echo the stored record
///
/// Nothing is stored unless the whole body was read.
///
/// # Errors
///
/// Returns error if the bucket id is empty or the body cannot be read
pub async fn capture<B>(
    request: Request<B>,
    bucket_id: &str,
    remote_addr: SocketAddr,
    store: &RecordStore,
) -> Result<HttpResponse>
where
    B: Body,
    B::Error: Display,
{
    if bucket_id.is_empty() {
        return Err(DumpError::InvalidBucketId);
    }

    let (parts, body) = request.into_parts();
    let body = read_body(body).await?;

    let record = build_record(&parts, body, remote_addr);
    let stored = store.append(bucket_id, record);

    debug!(
        "Captured {} {} into '{}' ({} bytes, {} records)",
        stored.method,
        stored.url.path,
        bucket_id,
        stored.body_len(),
        store.bucket_len(bucket_id)
    );

    response::json(StatusCode::OK, &*stored)
}

/// Read the whole request body
///
/// # Errors
///
/// Returns error if the body stream fails
pub async fn read_body<B>(body: B) -> Result<Bytes>
where
    B: Body,
    B::Error: Display,
{
    let collected = body
        .collect()
        .await
        .map_err(|e| DumpError::BodyRead(e.to_string()))?;

    Ok(collected.to_bytes())
}

/// Build a record from request metadata and its body
#[must_use]
pub fn build_record(parts: &Parts, body: Bytes, remote_addr: SocketAddr) -> Record {
    let uri = &parts.uri;

    let mut headers = MultiMap::new();
    for name in parts.headers.keys() {
        if *name == HOST {
            continue;
        }
        let canonical = canonical_header_name(name.as_str());
        for value in parts.headers.get_all(name) {
            headers.append(
                canonical.clone(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
    }

    let host = match uri.authority() {
        Some(authority) => authority.to_string(),
        None => parts
            .headers
            .get(HOST)
            .map(|h| String::from_utf8_lossy(h.as_bytes()).into_owned())
            .unwrap_or_default(),
    };

    Record {
        method: parts.method.to_string(),
        url: RecordUrl::new(
            uri.scheme_str().unwrap_or_default(),
            uri.authority().map(|a| a.as_str()).unwrap_or_default(),
            uri.path(),
            uri.query().unwrap_or_default(),
        ),
        proto: format!("{:?}", parts.version),
        headers,
        body,
        host,
        remote_addr: remote_addr.to_string(),
    }
}
