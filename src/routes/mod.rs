// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{broadcast, mpsc, watch};
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::models::{MetricsSummary, PushMessage};
use crate::worker::InstallRequest;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) push_tx: broadcast::Sender<PushMessage>,
    pub(crate) summary_rx: watch::Receiver<MetricsSummary>,
    pub(crate) install_tx: mpsc::Sender<InstallRequest>,
    pub(crate) live_connections: Arc<AtomicUsize>,
    pub(crate) started_at: std::time::Instant,
    pub(crate) config: AppConfig,
}

pub fn app(
    push_tx: broadcast::Sender<PushMessage>,
    summary_rx: watch::Receiver<MetricsSummary>,
    install_tx: mpsc::Sender<InstallRequest>,
    live_connections: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        push_tx,
        summary_rx,
        install_tx,
        live_connections,
        started_at: std::time::Instant::now(),
        config,
    };
    Router::new()
        .route("/", get(|| async { "thermocast metrics server" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/summary", get(http::summary_handler)) // GET /summary
        .route("/install", post(http::install_handler)) // POST /install
        .route("/healthz", get(http::healthz_handler)) // GET /healthz
        .route("/livez", get(http::livez_handler)) // GET /livez
        .route("/live", get(ws::ws_live)) // WS /live
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
