//! Client address extraction for rate-limit keys
//!
//! Forwarding headers are only as trustworthy as the proxies in front of the
//! service, so the number of trusted hops decides which entry of
//! `X-Forwarded-For` is taken as the client.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Client address used to key rate limits.
///
/// Order of preference: `X-Forwarded-For` (honouring `trusted_proxy_count`),
/// `X-Real-IP`, then the socket peer. Returns `"unknown"` when nothing
/// usable is available.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| from_forwarded_for(v, trusted_proxy_count))
    {
        return ip.to_string();
    }

    if let Some(ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
    {
        return ip.to_string();
    }

    socket_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Pick the client from a `client, proxy1, proxy2` chain.
///
/// With N trusted proxies the last N entries were appended by them, so the
/// entry just before those is the client. With no trusted proxy, or a chain
/// too short for the configured count, only the nearest hop is used.
fn from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> Option<IpAddr> {
    let hops: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let candidate = if trusted_proxy_count == 0 || hops.len() <= trusted_proxy_count {
        hops.last()?
    } else {
        hops.get(hops.len() - trusted_proxy_count - 1)?
    };

    candidate.parse().ok()
}
