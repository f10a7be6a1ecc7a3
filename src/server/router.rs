//! Path dispatch and access logging

use std::borrow::Cow;
use std::fmt::Display;
use std::net::SocketAddr;
use std::time::Instant;

use hyper::body::Body;
use hyper::{Method, Request};
use tracing::{debug, info};

use crate::Result;

use super::response::{self, HttpResponse};
use super::{assets, capture, query, session, AppState};

/// Where a request path leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    /// `/x/{bucket}` or `/x/{bucket}/...`, any method
    Capture(Cow<'a, str>),
    /// `/api/record/`
    ListAll,
    /// `/api/record/{bucket}`
    GetOne(Cow<'a, str>),
    /// Anything else under `/api`
    ApiNotFound,
    /// Everything else: the bundled UI
    Static,
}

impl Route<'_> {
    fn is_api(&self) -> bool {
        matches!(self, Route::ListAll | Route::GetOne(_) | Route::ApiNotFound)
    }
}

/// Resolve a request path to a route
#[must_use]
pub fn route(path: &str) -> Route<'_> {
    if let Some(rest) = path.strip_prefix("/x/") {
        let bucket = rest.split('/').next().unwrap_or_default();
        return Route::Capture(decode_segment(bucket));
    }

    let Some(api) = path
        .strip_prefix("/api")
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
    else {
        return Route::Static;
    };

    match api.strip_prefix("/record") {
        Some("" | "/") => Route::ListAll,
        Some(rest) => match rest.strip_prefix('/') {
            Some(bucket) if !bucket.contains('/') => Route::GetOne(decode_segment(bucket)),
            _ => Route::ApiNotFound,
        },
        None => Route::ApiNotFound,
    }
}

fn decode_segment(segment: &str) -> Cow<'_, str> {
    urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment))
}

/// Handle one request end to end; never fails, errors become responses
pub async fn dispatch<B>(
    request: Request<B>,
    remote_addr: SocketAddr,
    state: &AppState,
) -> HttpResponse
where
    B: Body,
    B::Error: Display,
{
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = match handle(request, &path, remote_addr, state).await {
        Ok(response) => response,
        Err(e) => response::error_response(&e),
    };

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_us = started.elapsed().as_micros() as u64,
        remote = %remote_addr,
        "request"
    );

    response
}

async fn handle<B>(
    request: Request<B>,
    path: &str,
    remote_addr: SocketAddr,
    state: &AppState,
) -> Result<HttpResponse>
where
    B: Body,
    B::Error: Display,
{
    let route = route(path);

    if let Route::Capture(bucket_id) = &route {
        return capture::capture(request, bucket_id, remote_addr, &state.store).await;
    }

    if route.is_api() {
        let client = session::ensure_client_id(request.headers())?;
        debug!(client = client.value(), "API request {}", path);
        let mut response = match api(&route, request.method(), state) {
            Ok(response) => response,
            Err(e) => response::error_response(&e),
        };
        client.apply(&mut response)?;
        return Ok(response);
    }

    match *request.method() {
        Method::GET | Method::HEAD => assets::serve(state.ui_dir.as_deref(), path).await,
        _ => Ok(response::method_not_allowed("GET, HEAD")),
    }
}

fn api(route: &Route<'_>, method: &Method, state: &AppState) -> Result<HttpResponse> {
    let is_get = *method == Method::GET;

    match route {
        Route::ListAll if is_get => query::list_all(&state.store),
        Route::GetOne(bucket_id) if is_get => query::get_one(&state.store, bucket_id),
        Route::ListAll | Route::GetOne(_) => Ok(response::method_not_allowed("GET")),
        _ => Ok(response::not_found_json()),
    }
}
