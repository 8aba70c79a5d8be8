// Background metrics worker: the single writer for MetricsState.
// Mutations happen here only; readers get immutable summary snapshots via
// the watch channel (snapshot swap, never a torn read).

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Duration, Instant, interval};

use crate::metrics::{MetricsSource, MetricsState, MilestoneTracker};
use crate::models::{
    HeartbeatData, InstallReport, MetricsSummary, MilestoneData, NewInstallData, PushMessage,
};

/// Rate limit for "no receivers" logging (avoid a line every tick when no one is on /live)
const NO_RECEIVERS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Install ingestion request: the report plus a reply carrying the updated
/// cumulative count.
pub type InstallRequest = (InstallReport, oneshot::Sender<u64>);

/// State, channels, and shutdown for the worker.
pub struct WorkerDeps {
    pub state: MetricsState,
    pub source: Box<dyn MetricsSource>,
    pub milestones: MilestoneTracker,
    pub push_tx: broadcast::Sender<PushMessage>,
    pub summary_tx: watch::Sender<MetricsSummary>,
    pub install_rx: mpsc::Receiver<InstallRequest>,
    pub live_connections: Arc<AtomicUsize>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

/// Worker timing and logging config.
pub struct WorkerConfig {
    pub update_interval_secs: u64,
    pub heartbeat_interval_secs: u64,
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        mut state,
        mut source,
        mut milestones,
        push_tx,
        summary_tx,
        mut install_rx,
        live_connections,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        update_interval_secs,
        heartbeat_interval_secs,
        stats_log_interval_secs,
    } = config;

    tokio::spawn(async move {
        let mut update_tick = interval(Duration::from_secs(update_interval_secs));
        update_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut heartbeat_tick = interval(Duration::from_secs(heartbeat_interval_secs));
        heartbeat_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut installs_recorded: u64 = 0;
        let mut milestones_fired: u64 = 0;
        let mut last_no_receivers_log: Option<Instant> = None;

        let worker_span = tracing::span!(tracing::Level::DEBUG, "worker", update_interval_secs);
        let _guard = worker_span.enter();

        loop {
            tokio::select! {
                _ = update_tick.tick() => {
                    source.update(&mut state);
                    state.stamp();
                    summary_tx.send_replace(state.summary());
                    milestones_fired +=
                        fire_milestones(&state, &mut milestones, &push_tx);
                }
                _ = heartbeat_tick.tick() => {
                    let heartbeat = PushMessage::Heartbeat(HeartbeatData {
                        active_instances: state.active_instances,
                        p95_latency: state.p95_latency,
                        installs_per_hour: state.installs_per_hour,
                    });
                    if push_tx.send(heartbeat).is_err() {
                        let should_log = last_no_receivers_log
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_LOG_INTERVAL);
                        if should_log {
                            tracing::debug!(
                                operation = "broadcast_heartbeat",
                                "No live clients; broadcast channel has no receivers"
                            );
                            last_no_receivers_log = Some(Instant::now());
                        }
                    }
                }
                req = install_rx.recv() => {
                    match req {
                        Some((report, reply)) => {
                            let total = state.record_install(report.country.as_deref());
                            state.stamp();
                            summary_tx.send_replace(state.summary());
                            // Lower latency than the heartbeat cadence so
                            // install spikes are visible immediately.
                            let _ = push_tx.send(PushMessage::NewInstall(NewInstallData {
                                global_installs: total,
                                country: report.country.clone(),
                            }));
                            milestones_fired +=
                                fire_milestones(&state, &mut milestones, &push_tx);
                            installs_recorded += 1;
                            tracing::info!(
                                country = report.country.as_deref().unwrap_or("unknown"),
                                total_installs = total,
                                "Install recorded"
                            );
                            let _ = reply.send(total);
                        }
                        None => {
                            tracing::debug!("Install channel closed");
                            break;
                        }
                    }
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        live_clients =
                            live_connections.load(std::sync::atomic::Ordering::Relaxed),
                        installs_recorded,
                        milestones_fired,
                        "app stats"
                    );
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
            }
        }
    })
}

/// Scan milestones against the cumulative counter and broadcast one event
/// per newly crossed threshold, in ascending order. Returns the fire count.
fn fire_milestones(
    state: &MetricsState,
    milestones: &mut MilestoneTracker,
    push_tx: &broadcast::Sender<PushMessage>,
) -> u64 {
    let mut fired = 0;
    for (threshold, message) in milestones.crossings(state.total_installs) {
        tracing::info!(
            threshold,
            message = %message,
            installs = state.total_installs,
            "Milestone achieved"
        );
        let _ = push_tx.send(PushMessage::Milestone(MilestoneData {
            threshold,
            message,
            installs: state.total_installs,
            p95_latency: state.p95_latency,
            reliability: state.reliability,
        }));
        fired += 1;
    }
    fired
}
