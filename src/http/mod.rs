//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, span, metrics)
//!     → handlers.rs (method dispatch)
//!         OPTIONS → preflight
//!         GET     → quota report
//!         POST    → quota → upload → upstream → count
//!         other   → 405
//!     → response.rs (JSON errors, image attachment, CORS)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, GatewayServer};
