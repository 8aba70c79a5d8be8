// End-to-end live client tests against a real listener: transport
// selection, fallback polling, staleness, shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use futures_util::StreamExt;
use thermocast::client::{ConnectionStatus, DashboardState, LiveClient, LiveClientConfig};
use thermocast::config::AppConfig;
use thermocast::metrics::{MetricsSource, MetricsState, MilestoneTracker};
use thermocast::routes;
use thermocast::worker::{self, WorkerConfig, WorkerDeps};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Duration, timeout};

const TEST_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[publishing]
heartbeat_interval_secs = 1
broadcast_capacity = 16

[monitoring]
update_interval_secs = 5
staleness_window_secs = 30
stats_log_interval_secs = 60

[client]
poll_interval_secs = 1
staleness_timeout_secs = 45
retry_base_ms = 200
retry_cap_ms = 5000
max_poll_failures = 3
offline_retry_delay_secs = 5
"#;

struct IdleSource;

impl MetricsSource for IdleSource {
    fn update(&mut self, _state: &mut MetricsState) {}
}

struct ServerCtx {
    addr: SocketAddr,
    _shutdown_tx: oneshot::Sender<()>,
}

/// Full server stack on an ephemeral port, heartbeating every second.
async fn spawn_backend() -> ServerCtx {
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();
    let state = MetricsState::seed();
    let (push_tx, _) = broadcast::channel(config.publishing.broadcast_capacity);
    let (summary_tx, summary_rx) = watch::channel(state.summary());
    let (install_tx, install_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let live_connections = Arc::new(AtomicUsize::new(0));
    worker::spawn(
        WorkerDeps {
            state,
            source: Box::new(IdleSource),
            milestones: MilestoneTracker::standard(),
            push_tx: push_tx.clone(),
            summary_tx,
            install_rx,
            live_connections: live_connections.clone(),
            shutdown_rx,
        },
        WorkerConfig {
            update_interval_secs: 1000,
            heartbeat_interval_secs: 1,
            stats_log_interval_secs: 1000,
        },
    );
    let app = routes::app(push_tx, summary_rx, install_tx, live_connections, config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    ServerCtx {
        addr,
        _shutdown_tx: shutdown_tx,
    }
}

/// Reserve an ephemeral port with nothing listening on it.
async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn client_config(ws_addr: SocketAddr, http_addr: SocketAddr) -> LiveClientConfig {
    LiveClientConfig {
        ws_url: format!("ws://{ws_addr}/live"),
        summary_url: format!("http://{http_addr}/summary"),
        poll_interval: Duration::from_secs(1),
        staleness_timeout: Duration::from_secs(45),
        retry_base: Duration::from_millis(200),
        retry_cap: Duration::from_secs(5),
        max_poll_failures: 3,
        offline_retry_delay: Duration::from_secs(5),
    }
}

async fn wait_status(
    rx: &mut watch::Receiver<ConnectionStatus>,
    want: ConnectionStatus,
    secs: u64,
) {
    let result = timeout(Duration::from_secs(secs), rx.wait_for(|s| *s == want)).await;
    assert!(result.is_ok(), "timed out waiting for status {want:?}");
    result.unwrap().expect("status channel closed");
}

async fn wait_state(
    rx: &mut watch::Receiver<DashboardState>,
    pred: impl FnMut(&DashboardState) -> bool,
    secs: u64,
) -> DashboardState {
    let result = timeout(Duration::from_secs(secs), rx.wait_for(pred)).await;
    assert!(result.is_ok(), "timed out waiting for dashboard state");
    result.unwrap().expect("state channel closed").clone()
}

#[tokio::test]
async fn test_live_channel_populates_dashboard() {
    let backend = spawn_backend().await;
    let mut client = LiveClient::spawn(client_config(backend.addr, backend.addr));
    let mut status_rx = client.status();
    let mut state_rx = client.state();

    wait_status(&mut status_rx, ConnectionStatus::Live, 5).await;
    // Welcome full_update carries the whole seeded projection.
    let state = wait_state(&mut state_rx, |s| s.total_installs == 1247, 5).await;
    assert_eq!(state.active_instances, 1156);
    assert_eq!(state.country_count, 7);
    // Heartbeats keep flowing and feed the latency history.
    wait_state(&mut state_rx, |s| !s.latency_history.is_empty(), 5).await;

    client.stop().await;
    client.stop().await; // idempotent
}

#[tokio::test]
async fn test_fallback_polling_when_live_channel_down() {
    let backend = spawn_backend().await;
    let dead = dead_addr().await;
    // Live channel unreachable, REST reachable.
    let mut config = client_config(dead, backend.addr);
    config.retry_base = Duration::from_secs(5);
    config.retry_cap = Duration::from_secs(5);
    let mut client = LiveClient::spawn(config);
    let mut status_rx = client.status();
    let mut state_rx = client.state();

    wait_status(&mut status_rx, ConnectionStatus::Degraded, 10).await;
    let state = wait_state(&mut state_rx, |s| s.total_installs == 1247, 10).await;
    assert_eq!(state.country_count, 7);

    client.stop().await;
}

#[tokio::test]
async fn test_offline_after_repeated_poll_failures() {
    let dead = dead_addr().await;
    let mut config = client_config(dead, dead);
    config.retry_base = Duration::from_secs(10);
    config.retry_cap = Duration::from_secs(10);
    config.max_poll_failures = 2;
    config.offline_retry_delay = Duration::from_secs(10);
    let mut client = LiveClient::spawn(config);
    let mut status_rx = client.status();

    wait_status(&mut status_rx, ConnectionStatus::Offline, 10).await;

    client.stop().await;
}

#[tokio::test]
async fn test_silent_live_channel_degrades_but_stays_connected() {
    // WebSocket server that completes the handshake and then says nothing.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                    let (_write, mut read) = ws.split();
                    while let Some(Ok(_)) = read.next().await {}
                }
            });
        }
    });

    let mut config = client_config(addr, addr);
    config.staleness_timeout = Duration::from_secs(2);
    let mut client = LiveClient::spawn(config);
    let mut status_rx = client.status();

    wait_status(&mut status_rx, ConnectionStatus::Live, 5).await;
    // Well inside the staleness window the channel is still considered live.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(*status_rx.borrow(), ConnectionStatus::Live);
    wait_status(&mut status_rx, ConnectionStatus::Degraded, 5).await;

    client.stop().await;
}

#[tokio::test]
async fn test_stop_during_fallback_returns_promptly() {
    let dead = dead_addr().await;
    let mut client = LiveClient::spawn(client_config(dead, dead));
    tokio::time::sleep(Duration::from_millis(300)).await;
    timeout(Duration::from_secs(2), client.stop())
        .await
        .expect("stop did not return");
}
