//! Endpoint handlers, one per method.
//!
//! POST runs the stages in order and stops at the first failure:
//! quota check → body read → parse/validate → upstream → count → respond.

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::error::{GatewayError, GatewayResult};
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::quota::client_key;
use crate::upload::{parse_upload, BodyEncoding, RawBody};

const CONTENT_TRANSFER_ENCODING: &str = "content-transfer-encoding";

/// OPTIONS: CORS preflight.
pub async fn preflight() -> Response {
    response::preflight()
}

/// Any method other than GET, POST and OPTIONS.
pub async fn method_not_allowed() -> Response {
    response::method_not_allowed()
}

/// GET: report quota state without consuming a unit.
pub async fn quota_status(State(state): State<AppState>, request: Request) -> Response {
    let (parts, _) = request.into_parts();
    let key = request_client_key(&state, &parts);

    match state.limiter.get_or_create(&key).await {
        Ok(record) => response::quota_status(&state.limiter.snapshot(&record)),
        Err(e) => GatewayError::from(e).into_response(),
    }
}

/// POST: generate an image from the uploaded one.
pub async fn generate(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let key = request_client_key(&state, &parts);

    match generate_image(&state, &key, &parts.headers, body).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn generate_image(
    state: &AppState,
    key: &str,
    headers: &HeaderMap,
    body: Body,
) -> GatewayResult<Response> {
    let record = state.limiter.get_or_create(key).await?;
    if state.limiter.is_exceeded(&record) {
        tracing::warn!(client = %key, used = record.count, "Daily quota exhausted");
        metrics::record_quota_rejected();
        return Err(GatewayError::RateLimited(state.limiter.snapshot(&record)));
    }

    let bytes = read_body(body, state.config.security.max_body_size).await?;
    let raw = RawBody {
        bytes,
        encoding: BodyEncoding::from_header(header_str(headers, CONTENT_TRANSFER_ENCODING)),
    };

    let upload = parse_upload(header_str(headers, CONTENT_TYPE.as_str()), raw).await?;
    tracing::debug!(
        client = %key,
        username = %upload.username,
        file_name = %upload.file_name,
        bytes = upload.image.len(),
        "Upload parsed"
    );

    let image = state.upstream.generate(&upload).await?;

    let record = state.limiter.increment(key).await?;
    let snapshot = state.limiter.snapshot(&record);
    tracing::info!(
        client = %key,
        username = %upload.username,
        used = snapshot.used,
        remaining = snapshot.remaining,
        "Image generated"
    );

    Ok(response::image(
        image,
        &upload.username,
        &snapshot,
        &state.config.upstream.filename_prefix,
        state.limiter.now(),
    ))
}

/// Buffer the body up to `limit` bytes. Only overrunning the limit is a 413.
async fn read_body(body: Body, limit: usize) -> GatewayResult<Bytes> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(GatewayError::PayloadTooLarge(limit))
        }
        Err(e) => Err(GatewayError::Unexpected(format!(
            "Failed to read request body: {}",
            e
        ))),
    }
}

fn request_client_key(state: &AppState, parts: &Parts) -> String {
    let peer = if state.config.quota.use_peer_address {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip())
    } else {
        None
    };
    client_key(&parts.headers, peer)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
