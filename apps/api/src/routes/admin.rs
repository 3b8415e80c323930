//! Operator endpoints: rate-limit resets and the IP deny list.
//!
//! Guarded by a shared token in the `x-admin-token` header. Failed
//! attempts are charged against the `auth` limiter class so the token
//! cannot be brute-forced; successful calls are not.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::ratelimit::middleware::{client_ip, enforce};
use crate::state::AppState;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Debug, Deserialize)]
pub struct RateLimitResetRequest {
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpBlockRequest {
    #[serde(default)]
    pub ip: String,
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub success: bool,
    pub message: String,
}

impl AdminResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// POST /api/v1/admin/rate-limit/reset
pub async fn handle_rate_limit_reset(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<RateLimitResetRequest>,
) -> Result<Json<AdminResponse>, AppError> {
    authorize(&state, &headers, peer.map(|ConnectInfo(addr)| addr)).await?;

    let mut missing = Vec::new();
    if req.class.trim().is_empty() {
        missing.push("class");
    }
    if req.identifier.trim().is_empty() {
        missing.push("identifier");
    }
    if !missing.is_empty() {
        return Err(AppError::missing_fields(&missing));
    }

    let class = req.class.trim();
    let limiter = state
        .limiters
        .by_class(class)
        .ok_or_else(|| AppError::Validation(format!("Unknown rate limit class: {class}")))?;
    limiter.reset(req.identifier.trim()).await?;

    tracing::info!(class, identifier = req.identifier.trim(), "rate limit reset");
    Ok(AdminResponse::ok(format!(
        "Rate limit '{class}' reset for '{}'",
        req.identifier.trim()
    )))
}

/// POST /api/v1/admin/ip-block
pub async fn handle_ip_block(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<IpBlockRequest>,
) -> Result<Json<AdminResponse>, AppError> {
    authorize(&state, &headers, peer.map(|ConnectInfo(addr)| addr)).await?;

    if req.ip.trim().is_empty() {
        return Err(AppError::missing_fields(&["ip"]));
    }
    state.blocker.block(req.ip.trim(), req.ttl_secs).await?;

    tracing::info!(ip = req.ip.trim(), ttl_secs = ?req.ttl_secs, "ip blocked");
    Ok(AdminResponse::ok(format!("Blocked {}", req.ip.trim())))
}

/// DELETE /api/v1/admin/ip-block/:ip
pub async fn handle_ip_unblock(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Path(ip): Path<String>,
) -> Result<Json<AdminResponse>, AppError> {
    authorize(&state, &headers, peer.map(|ConnectInfo(addr)| addr)).await?;

    state.blocker.unblock(ip.trim()).await?;

    tracing::info!(ip = ip.trim(), "ip unblocked");
    Ok(AdminResponse::ok(format!("Unblocked {}", ip.trim())))
}

/// Compares the presented token against `ADMIN_TOKEN`. No configured
/// token means the whole admin surface is off.
async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> Result<(), AppError> {
    let expected = state
        .config
        .admin_token
        .as_deref()
        .ok_or_else(|| AppError::Config("ADMIN_TOKEN is not configured".to_string()))?;

    let presented = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if presented != expected {
        let ip = client_ip(headers, peer);
        enforce(&state.limiters.auth, &ip).await?;
        return Err(AppError::Authentication);
    }
    Ok(())
}
