use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use thermocast::*;
use tokio::sync::{broadcast, mpsc, watch};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let state = metrics::MetricsState::seed();
    let (push_tx, _) =
        broadcast::channel::<models::PushMessage>(app_config.publishing.broadcast_capacity);
    let (summary_tx, summary_rx) = watch::channel(state.summary());
    let (install_tx, install_rx) = mpsc::channel::<worker::InstallRequest>(64);
    let live_connections = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let thermal_sampler = sampler::Sampler::new(
        Arc::new(sampler::ComponentSource),
        Arc::new(sampler::DefaultCoarse),
    );
    tracing::info!(class = ?thermal_sampler.hardware_class(), "sensor sampler ready");

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            state,
            source: Box::new(metrics::SyntheticSource::with_sampler(thermal_sampler)),
            milestones: metrics::MilestoneTracker::standard(),
            push_tx: push_tx.clone(),
            summary_tx,
            install_rx,
            live_connections: live_connections.clone(),
            shutdown_rx,
        },
        worker::WorkerConfig {
            update_interval_secs: app_config.monitoring.update_interval_secs,
            heartbeat_interval_secs: app_config.publishing.heartbeat_interval_secs,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    let app = routes::app(
        push_tx,
        summary_rx,
        install_tx,
        live_connections,
        app_config.clone(),
    );
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = worker_handle.await;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
