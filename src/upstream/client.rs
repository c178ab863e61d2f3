//! HTTP client for the image generation API.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::upload::UploadRequest;

/// Errors from the external API call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request could not be built or sent.
    #[error("External API unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("External API error ({0})")]
    Status(StatusCode),

    /// The response body could not be read.
    #[error("External API response unreadable: {0}")]
    Body(#[source] reqwest::Error),
}

impl UpstreamError {
    /// Label for the `outcome` dimension of the upstream request metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Status(_) => "status",
            UpstreamError::Body(_) => "body",
        }
    }
}

/// Image returned by the API.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Client for the configured generation endpoint.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    endpoint: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(UpstreamError::Transport)?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit the upload and wait for the generated image.
    pub async fn generate(&self, upload: &UploadRequest) -> Result<GeneratedImage, UpstreamError> {
        let start = Instant::now();
        let result = self.send(upload).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        metrics::record_upstream(outcome, start);

        match &result {
            Ok(image) => tracing::debug!(
                bytes = image.bytes.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Upstream generated image"
            ),
            Err(e) => tracing::warn!(endpoint = %self.endpoint, error = %e, "Upstream call failed"),
        }
        result
    }

    async fn send(&self, upload: &UploadRequest) -> Result<GeneratedImage, UpstreamError> {
        let form = build_form(upload)?;

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(UpstreamError::Body)?;

        Ok(GeneratedImage {
            bytes,
            content_type,
        })
    }
}

fn build_form(upload: &UploadRequest) -> Result<Form, UpstreamError> {
    let mut image = Part::bytes(upload.image.to_vec()).file_name(upload.file_name.clone());
    if let Some(mime) = &upload.content_type {
        image = image.mime_str(mime).map_err(UpstreamError::Transport)?;
    }

    Ok(Form::new()
        .part("image", image)
        .text("username", upload.username.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: Option<&str>) -> UploadRequest {
        UploadRequest {
            image: Bytes::from_static(b"png"),
            file_name: "hero.png".into(),
            content_type: content_type.map(str::to_string),
            username: "budi".into(),
        }
    }

    #[test]
    fn test_form_accepts_part_type() {
        assert!(build_form(&upload(Some("image/png"))).is_ok());
        assert!(build_form(&upload(None)).is_ok());
    }

    #[test]
    fn test_form_rejects_bad_part_type() {
        assert!(matches!(
            build_form(&upload(Some("not a mime"))),
            Err(UpstreamError::Transport(_))
        ));
    }

    #[test]
    fn test_outcome_labels() {
        let reqwest_err = || Part::bytes(Vec::new()).mime_str("not a mime").unwrap_err();

        assert_eq!(UpstreamError::Transport(reqwest_err()).outcome(), "transport");
        assert_eq!(
            UpstreamError::Status(StatusCode::BAD_GATEWAY).outcome(),
            "status"
        );
        assert_eq!(UpstreamError::Body(reqwest_err()).outcome(), "body");
    }

    #[test]
    fn test_timeout_is_optional() {
        let mut config = UpstreamConfig::default();
        assert!(UpstreamClient::new(&config).is_ok());
        config.timeout_secs = Some(30);
        let client = UpstreamClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), config.endpoint);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let config = UpstreamConfig {
            endpoint: "http://127.0.0.1:1/generate".into(),
            ..UpstreamConfig::default()
        };
        let client = UpstreamClient::new(&config).unwrap();
        let err = client.generate(&upload(None)).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
    }
}
