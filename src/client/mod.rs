// Live metrics channel, client side: WebSocket-first with staleness
// detection, jittered reconnect, and a REST polling fallback. One driver
// task owns the transports, so at most one of them applies updates at a
// time and messages are applied strictly in arrival order.

mod backoff;
mod state;

pub use backoff::Backoff;
pub use state::{ConnectionStatus, DashboardState};

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{oneshot, watch};
use tokio::time::{Instant, interval, sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::config::ClientConfig;
use crate::models::{MetricsSummary, PushMessage};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Endpoints and timing for the live client.
#[derive(Debug, Clone)]
pub struct LiveClientConfig {
    pub ws_url: String,
    pub summary_url: String,
    pub poll_interval: Duration,
    pub staleness_timeout: Duration,
    pub retry_base: Duration,
    pub retry_cap: Duration,
    pub max_poll_failures: u32,
    pub offline_retry_delay: Duration,
}

impl LiveClientConfig {
    /// Build from the shared config section and a server address ("host:port").
    pub fn from_config(cfg: &ClientConfig, server_addr: &str) -> Self {
        Self {
            ws_url: format!("ws://{server_addr}/live"),
            summary_url: format!("http://{server_addr}/summary"),
            poll_interval: Duration::from_secs(cfg.poll_interval_secs),
            staleness_timeout: Duration::from_secs(cfg.staleness_timeout_secs),
            retry_base: Duration::from_millis(cfg.retry_base_ms),
            retry_cap: Duration::from_millis(cfg.retry_cap_ms),
            max_poll_failures: cfg.max_poll_failures,
            offline_retry_delay: Duration::from_secs(cfg.offline_retry_delay_secs),
        }
    }
}

/// Handle to the running client. State and connection status are watch
/// channels: a renderer always reads the latest view, and several updates
/// arriving within one frame collapse to a single observed change.
pub struct LiveClient {
    state_rx: watch::Receiver<DashboardState>,
    status_rx: watch::Receiver<ConnectionStatus>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl LiveClient {
    pub fn spawn(config: LiveClientConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(DashboardState::new());
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run(config, state_tx, status_tx, shutdown_rx));
        Self {
            state_rx,
            status_rx,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn state(&self) -> watch::Receiver<DashboardState> {
        self.state_rx.clone()
    }

    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Idempotent teardown: signals the driver task and waits for it.
    /// No background work survives this call.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

enum Phase {
    Shutdown,
    Reconnect,
}

struct Driver {
    config: LiveClientConfig,
    http: reqwest::Client,
    state: DashboardState,
    state_tx: watch::Sender<DashboardState>,
    status_tx: watch::Sender<ConnectionStatus>,
}

async fn run(
    config: LiveClientConfig,
    state_tx: watch::Sender<DashboardState>,
    status_tx: watch::Sender<ConnectionStatus>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut backoff = Backoff::new(config.retry_base, config.retry_cap);
    let mut driver = Driver {
        http: reqwest::Client::new(),
        state: DashboardState::new(),
        config,
        state_tx,
        status_tx,
    };

    loop {
        driver.set_status(ConnectionStatus::Connecting);
        match connect_async(driver.config.ws_url.as_str()).await {
            Ok((socket, _)) => {
                tracing::info!(url = %driver.config.ws_url, "live channel connected");
                backoff.reset();
                driver.set_status(ConnectionStatus::Live);
                if let Phase::Shutdown = driver.run_live(socket, &mut shutdown_rx).await {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "live channel connect failed");
            }
        }
        driver.set_status(ConnectionStatus::Connecting);
        let delay = backoff.next_delay();
        tracing::info!(
            delay_ms = delay.as_millis() as u64,
            attempt = backoff.attempt(),
            "live channel down, polling fallback until reconnect"
        );
        if let Phase::Shutdown = driver.run_fallback(delay, &mut shutdown_rx).await {
            return;
        }
    }
}

impl Driver {
    fn set_status(&self, status: ConnectionStatus) {
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                tracing::info!(?status, "connection status");
                *current = status;
                true
            }
        });
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    /// Drive the low-latency channel until it closes, errors, or we shut
    /// down. The staleness timer resets on every data frame; when it fires
    /// the channel stays open but the view is marked degraded.
    async fn run_live(&mut self, socket: WsStream, shutdown_rx: &mut oneshot::Receiver<()>) -> Phase {
        let (mut write, mut read) = socket.split();
        let staleness = sleep(self.config.staleness_timeout);
        tokio::pin!(staleness);
        loop {
            tokio::select! {
                _ = &mut *shutdown_rx => {
                    let _ = write.close().await;
                    return Phase::Shutdown;
                }
                _ = &mut staleness => {
                    self.set_status(ConnectionStatus::Degraded);
                    staleness.as_mut().reset(Instant::now() + self.config.staleness_timeout);
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            staleness.as_mut().reset(Instant::now() + self.config.staleness_timeout);
                            self.set_status(ConnectionStatus::Live);
                            match serde_json::from_str::<PushMessage>(text.as_str()) {
                                Ok(push) => {
                                    if self.state.apply_push(&push) {
                                        self.publish();
                                    }
                                }
                                Err(e) => {
                                    // Malformed payloads don't reset connection state.
                                    tracing::warn!(error = %e, "discarding malformed live message");
                                }
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            if write.send(Message::Pong(payload)).await.is_err() {
                                return Phase::Reconnect;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!("live channel closed");
                            return Phase::Reconnect;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "live channel error");
                            return Phase::Reconnect;
                        }
                    }
                }
            }
        }
    }

    /// Poll GET /summary (immediately, then on the poll interval) while
    /// waiting out the reconnect delay. Repeated poll failure surfaces
    /// OFFLINE, stops the poller, and retries the live channel after a
    /// short fixed delay so we never sit polling a dead backend forever.
    async fn run_fallback(
        &mut self,
        reconnect_delay: Duration,
        shutdown_rx: &mut oneshot::Receiver<()>,
    ) -> Phase {
        let reconnect_at = sleep(reconnect_delay);
        tokio::pin!(reconnect_at);
        let mut poll_tick = interval(self.config.poll_interval);
        poll_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut failures: u32 = 0;
        loop {
            tokio::select! {
                _ = &mut *shutdown_rx => return Phase::Shutdown,
                _ = &mut reconnect_at => return Phase::Reconnect,
                _ = poll_tick.tick() => {
                    match self.poll_summary().await {
                        Ok(summary) => {
                            failures = 0;
                            if self.state.apply_summary(&summary) {
                                self.publish();
                            }
                            self.set_status(ConnectionStatus::Degraded);
                        }
                        Err(e) => {
                            failures += 1;
                            tracing::warn!(error = %e, failures, "fallback poll failed");
                            if failures >= self.config.max_poll_failures {
                                self.set_status(ConnectionStatus::Offline);
                                tokio::select! {
                                    _ = &mut *shutdown_rx => return Phase::Shutdown,
                                    _ = sleep(self.config.offline_retry_delay) => return Phase::Reconnect,
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    async fn poll_summary(&self) -> anyhow::Result<MetricsSummary> {
        let resp = self
            .http
            .get(&self.config.summary_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json::<MetricsSummary>().await?)
    }
}
