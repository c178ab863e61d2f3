//! Error taxonomy for the generate endpoint.
//!
//! Every stage returns one of these; [`GatewayError::into_response`] is the only
//! place an error becomes an HTTP status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::response;
use crate::quota::{QuotaSnapshot, StoreError};
use crate::upstream::UpstreamError;

/// Problems with the inbound request itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadRequest {
    #[error("Content-Type must be multipart/form-data")]
    MissingContentType,

    #[error("Gambar tidak ditemukan!")]
    MissingImage,

    #[error("Username tidak boleh kosong!")]
    MissingUsername,

    #[error("Invalid multipart body: {0}")]
    MalformedBody(String),
}

/// Any failure while serving a generate request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    BadRequest(#[from] BadRequest),

    #[error("Rate limit exceeded")]
    RateLimited(QuotaSnapshot),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Unexpected(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Upstream(_) | GatewayError::Store(_) | GatewayError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::BadRequest(e) => response::bad_request(&e),
            GatewayError::RateLimited(snapshot) => response::rate_limited(&snapshot),
            GatewayError::PayloadTooLarge(limit) => response::payload_too_large(limit),
            other => {
                tracing::error!(error = %other, "Generate request failed");
                response::server_error(&other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::from(BadRequest::MissingImage).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::from(UpstreamError::Status(StatusCode::BAD_GATEWAY)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::Unexpected("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request_messages() {
        assert_eq!(BadRequest::MissingImage.to_string(), "Gambar tidak ditemukan!");
        assert_eq!(
            BadRequest::MissingUsername.to_string(),
            "Username tidak boleh kosong!"
        );
        assert_eq!(
            GatewayError::from(BadRequest::MissingContentType).to_string(),
            "Content-Type must be multipart/form-data"
        );
    }
}
