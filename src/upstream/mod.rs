//! Outbound delegation to the external image API.
//!
//! # Responsibilities
//! - Rebuild the `image` + `username` multipart submission
//! - Issue exactly one POST per generate request (no retries)
//! - Buffer the full response body before returning it

pub mod client;

pub use client::{GeneratedImage, UpstreamClient, UpstreamError};
