// GET/POST handlers: version, summary, install ingestion, health probes

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tokio::sync::oneshot;

use super::AppState;
use crate::models::{InstallAck, InstallReport, now_ms};
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /summary — full metrics projection. The fallback transport: one
/// response fully reconstructs client state without any prior push events.
pub(super) async fn summary_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.summary_rx.borrow().clone())
}

/// POST /install — discrete install event. Forwarded to the worker (the
/// single writer), which broadcasts `new_install` immediately and replies
/// with the updated cumulative count.
pub(super) async fn install_handler(
    State(state): State<AppState>,
    Json(report): Json<InstallReport>,
) -> impl IntoResponse {
    let (reply_tx, reply_rx) = oneshot::channel();
    if state.install_tx.send((report, reply_tx)).await.is_err() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "metrics worker unavailable" })),
        )
            .into_response();
    }
    match reply_rx.await {
        Ok(total) => Json(InstallAck {
            success: true,
            total_installs: total,
        })
        .into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "metrics worker unavailable" })),
        )
            .into_response(),
    }
}

/// GET /healthz — process liveness: uptime and live-channel connection count.
pub(super) async fn healthz_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.started_at.elapsed().as_secs(),
        "connections": state
            .live_connections
            .load(std::sync::atomic::Ordering::Relaxed),
    }))
}

/// GET /livez — degraded (503) when no internal update has occurred within
/// the staleness window.
pub(super) async fn livez_handler(State(state): State<AppState>) -> impl IntoResponse {
    let last_update = state.summary_rx.borrow().last_update;
    let window_ms = state.config.monitoring.staleness_window_secs * 1000;
    let is_live = now_ms().saturating_sub(last_update) < window_ms;
    let code = if is_live {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(serde_json::json!({
            "status": if is_live { "live" } else { "degraded" },
            "lastUpdate": last_update,
            "connections": state
                .live_connections
                .load(std::sync::atomic::Ordering::Relaxed),
        })),
    )
}
