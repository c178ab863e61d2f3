//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use chrono::{TimeDelta, Utc};
use tokio::net::TcpListener;

use fakeml_gateway::config::GatewayConfig;
use fakeml_gateway::quota::{ManualClock, MemoryStore, QuotaLimiter, QuotaPolicy};
use fakeml_gateway::upstream::UpstreamClient;
use fakeml_gateway::{AppState, GatewayServer};

pub const BOUNDARY: &str = "gateway-test-boundary";
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-generated-image";

/// A mock image API that answers every POST with a fixed status.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub calls: Arc<AtomicU32>,
    pub last_body: Arc<Mutex<Option<Bytes>>>,
}

impl MockUpstream {
    pub fn endpoint(&self) -> String {
        format!("http://{}/api/maker/fakeml", self.addr)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Option<Bytes> {
        self.last_body.lock().unwrap().clone()
    }
}

/// Start a mock upstream that returns PNG bytes with `status`.
pub async fn start_mock_upstream(status: StatusCode) -> MockUpstream {
    let calls = Arc::new(AtomicU32::new(0));
    let last_body = Arc::new(Mutex::new(None));

    let handler_calls = calls.clone();
    let handler_body = last_body.clone();
    let app = Router::new().route(
        "/api/maker/fakeml",
        post(move |body: Bytes| {
            let calls = handler_calls.clone();
            let last_body = handler_body.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                *last_body.lock().unwrap() = Some(body);
                if status.is_success() {
                    (status, [(header::CONTENT_TYPE, "image/png")], PNG_BYTES).into_response()
                } else {
                    (status, "upstream failure").into_response()
                }
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream {
        addr,
        calls,
        last_body,
    }
}

/// Gateway router wired to `upstream`, with a hand-driven clock.
pub struct TestGateway {
    pub router: Router,
    pub clock: ManualClock,
    pub store: MemoryStore,
    pub config: GatewayConfig,
}

pub fn test_config(upstream: &MockUpstream, limit: u32) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.quota.daily_limit = limit;
    config.upstream.endpoint = upstream.endpoint();
    config
}

pub fn build_gateway(config: GatewayConfig) -> TestGateway {
    let store = MemoryStore::new();
    let clock = ManualClock::new(Utc::now());
    let limiter = QuotaLimiter::new(
        Arc::new(store.clone()),
        QuotaPolicy::new(config.quota.daily_limit, TimeDelta::hours(24)),
    )
    .with_clock(Arc::new(clock.clone()));
    let upstream = UpstreamClient::new(&config.upstream).unwrap();
    let state = AppState::new(config.clone(), limiter, upstream);
    let router = GatewayServer::new(config.clone(), state).router();

    TestGateway {
        router,
        clock,
        store,
        config,
    }
}

/// One part of a multipart body.
pub enum Field<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encode `fields` as `multipart/form-data` with [`BOUNDARY`].
pub fn multipart_body(fields: &[Field<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for field in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match field {
            Field::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Field::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: image/jpeg\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// A well-formed upload from `client`.
pub fn upload_request(path: &str, client: &str, username: &str) -> Request<Body> {
    let body = multipart_body(&[
        Field::File("image", "selfie.jpg", b"jpeg-bytes"),
        Field::Text("username", username),
    ]);
    Request::post(path)
        .header(header::CONTENT_TYPE, multipart_content_type())
        .header("x-forwarded-for", client)
        .body(Body::from(body))
        .unwrap()
}

pub fn quota_request(path: &str, client: &str) -> Request<Body> {
    Request::get(path)
        .header("x-forwarded-for", client)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
