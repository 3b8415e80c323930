//! Axum layer for the general per-IP gate, plus the helper handlers use for
//! their own endpoint-class limiters.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;
use crate::ratelimit::{RateLimitResult, RateLimiter};
use crate::state::AppState;

const HEADER_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const HEADER_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const HEADER_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Client identity for limiting. Behind the production proxy the peer
/// address is the proxy itself, so the first `X-Forwarded-For` entry wins
/// when present.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Router-wide gate: deny-list first, then the `general` limiter. Every
/// response that passes through picks up the `X-RateLimit-*` headers.
pub async fn general_rate_limit(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(request.headers(), peer.map(|ConnectInfo(addr)| addr));

    if state.blocker.is_blocked(&ip).await {
        tracing::warn!(ip, "request from blocked ip rejected");
        return AppError::Authorization.into_response();
    }

    let verdict = state.limiters.general.check(&ip).await;
    if !verdict.allowed {
        let mut response = verdict.clone().into_error().into_response();
        apply_headers(response.headers_mut(), &verdict);
        return response;
    }

    let mut response = next.run(request).await;
    apply_headers(response.headers_mut(), &verdict);
    response
}

/// Checks an endpoint-class limiter inside a handler, converting a denial
/// into the 429 error.
pub async fn enforce(limiter: &RateLimiter, identifier: &str) -> Result<(), AppError> {
    let verdict = limiter.check(identifier).await;
    if verdict.allowed {
        Ok(())
    } else {
        Err(verdict.into_error())
    }
}

fn apply_headers(headers: &mut HeaderMap, verdict: &RateLimitResult) {
    if let Ok(v) = HeaderValue::from_str(&verdict.limit.to_string()) {
        headers.insert(HEADER_LIMIT, v);
    }
    if let Ok(v) = HeaderValue::from_str(&verdict.remaining.to_string()) {
        headers.insert(HEADER_REMAINING, v);
    }
    if let Ok(v) = HeaderValue::from_str(&verdict.reset.to_string()) {
        headers.insert(HEADER_RESET, v);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::LimitSettings;
    use crate::ratelimit::{Algorithm, LimitPolicy, MemoryStore};

    fn parse_peer(addr: &str) -> Option<SocketAddr> {
        addr.parse().ok()
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let ip = client_ip(&headers, parse_peer("10.0.0.1:443"));
        assert_eq!(ip, "203.0.113.7");
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let headers = HeaderMap::new();
        let ip = client_ip(&headers, parse_peer("192.0.2.4:55555"));
        assert_eq!(ip, "192.0.2.4");
    }

    #[test]
    fn test_client_ip_without_any_source() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, None), "unknown");
    }

    #[test]
    fn test_client_ip_ignores_blank_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  ,10.0.0.1"));
        let ip = client_ip(&headers, parse_peer("192.0.2.4:9"));
        assert_eq!(ip, "192.0.2.4");
    }

    #[tokio::test]
    async fn test_enforce_passes_then_rejects() {
        let limiter = RateLimiter::new(
            "contact",
            LimitSettings::new(3600, 1),
            Algorithm::FixedWindow,
            LimitPolicy::FailOpen,
            Some(Arc::new(MemoryStore::new())),
        );
        assert!(enforce(&limiter, "1.2.3.4").await.is_ok());
        let err = enforce(&limiter, "1.2.3.4").await.unwrap_err();
        assert_eq!(err.code(), "RATE_LIMITED");
    }

    #[tokio::test]
    async fn test_headers_applied_from_verdict() {
        let verdict = RateLimitResult {
            allowed: true,
            limit: 60,
            remaining: 41,
            reset: 1_700_000_000,
            retry_after_secs: None,
        };
        let mut headers = HeaderMap::new();
        apply_headers(&mut headers, &verdict);
        assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "60");
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "41");
        assert_eq!(headers.get("x-ratelimit-reset").unwrap(), "1700000000");
    }
}
