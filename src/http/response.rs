//! Response shaping.
//!
//! # Responsibilities
//! - JSON bodies for quota reports and every error kind
//! - Attachment headers and quota headers on generated images
//! - The fixed CORS header set applied to every response
//!
//! # Design Decisions
//! - Errors always carry at least an `error` field
//! - 500s add a `message` that falls back to a generic text

use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, RETRY_AFTER};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::error::BadRequest;
use crate::quota::QuotaSnapshot;
use crate::upstream::GeneratedImage;

pub const ALLOW_ORIGIN: HeaderValue = HeaderValue::from_static("*");
pub const ALLOW_METHODS: HeaderValue = HeaderValue::from_static("GET, POST, OPTIONS");
pub const ALLOW_HEADERS: HeaderValue = HeaderValue::from_static("Content-Type");

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

const DEFAULT_IMAGE_TYPE: &str = "image/png";
const GENERATE_FAILED: &str = "Gagal generate gambar";
const GENERIC_FAILURE: &str = "Terjadi kesalahan pada server";

fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    (status, Json(body)).into_response()
}

/// Empty 200 for CORS preflight.
pub fn preflight() -> Response {
    StatusCode::OK.into_response()
}

pub fn quota_status(snapshot: &QuotaSnapshot) -> Response {
    (StatusCode::OK, Json(snapshot)).into_response()
}

pub fn method_not_allowed() -> Response {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        json!({ "error": "Method not allowed" }),
    )
}

pub fn bad_request(error: &BadRequest) -> Response {
    json_response(StatusCode::BAD_REQUEST, json!({ "error": error.to_string() }))
}

pub fn payload_too_large(limit: usize) -> Response {
    json_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        json!({ "error": format!("Request body exceeds {} bytes", limit) }),
    )
}

pub fn rate_limited(snapshot: &QuotaSnapshot) -> Response {
    let (hours, minutes) = snapshot.reset_in_hours_minutes();
    let body = json!({
        "error": "Rate limit exceeded",
        "message": format!("Limit harian tercapai! Coba lagi dalam {}j {}m", hours, minutes),
        "limit": snapshot.limit,
        "remaining": 0,
        "resetAt": snapshot.reset_at_iso(),
        "resetIn": snapshot.reset_in,
    });
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(RETRY_AFTER, snapshot.reset_in.to_string())],
        Json(body),
    )
        .into_response()
}

pub fn server_error(message: &str) -> Response {
    let message = if message.trim().is_empty() {
        GENERIC_FAILURE
    } else {
        message
    };
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": GENERATE_FAILED, "message": message }),
    )
}

/// 200 carrying the generated image as a download.
pub fn image(
    image: GeneratedImage,
    username: &str,
    snapshot: &QuotaSnapshot,
    filename_prefix: &str,
    now: DateTime<Utc>,
) -> Response {
    let content_type = image
        .content_type
        .unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_name(filename_prefix, username, now)
    );

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_DISPOSITION, disposition),
            (X_RATELIMIT_LIMIT, snapshot.limit.to_string()),
            (X_RATELIMIT_REMAINING, snapshot.remaining.to_string()),
            (X_RATELIMIT_RESET, snapshot.reset_at_iso()),
            (CACHE_CONTROL, "no-cache".to_string()),
        ],
        image.bytes,
    )
        .into_response()
}

/// `<prefix>_<username>_<unix millis>.png`
pub fn attachment_name(prefix: &str, username: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}.png",
        prefix,
        sanitize_file_component(username),
        now.timestamp_millis()
    )
}

/// Reduce `value` to characters safe inside a quoted header parameter.
fn sanitize_file_component(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
