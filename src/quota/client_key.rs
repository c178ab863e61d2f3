//! Client identity for quota accounting.

use std::net::IpAddr;

use axum::http::HeaderMap;

/// Bucket shared by every request that carries no usable address.
pub const UNKNOWN_CLIENT: &str = "unknown";

const CLIENT_IP: &str = "client-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Derive the quota key for a request.
///
/// Priority: `client-ip`, the first hop of `x-forwarded-for`, `x-real-ip`,
/// then `peer` when given, then [`UNKNOWN_CLIENT`]. Empty values are skipped.
pub fn client_key(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    header_value(headers, CLIENT_IP)
        .or_else(|| {
            header_value(headers, X_FORWARDED_FOR)
                .and_then(|chain| chain.split(',').next())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
        .or_else(|| header_value(headers, X_REAL_IP))
        .map(str::to_string)
        .or_else(|| peer.map(|ip| ip.to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
