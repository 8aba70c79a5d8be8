use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub publishing: PublishingConfig,
    pub monitoring: MonitoringConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Heartbeat broadcast cadence (small payload: active count, p95, installs/hour).
    pub heartbeat_interval_secs: u64,
    /// Max number of push messages kept in the broadcast channel (slow clients may lag).
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Gauge recomputation + milestone scan cadence.
    pub update_interval_secs: u64,
    /// /livez reports degraded when no internal update happened within this window.
    pub staleness_window_secs: u64,
    /// How often to log app stats (live clients, installs recorded) at INFO level.
    pub stats_log_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Fallback poll cadence against GET /summary while the live channel is down.
    pub poll_interval_secs: u64,
    /// No inbound frame within this window marks the live channel degraded.
    pub staleness_timeout_secs: u64,
    /// Reconnect backoff: delay = min(cap, base * 2^attempt) + jitter.
    pub retry_base_ms: u64,
    pub retry_cap_ms: u64,
    /// Consecutive poll failures before giving up on the fallback transport.
    pub max_poll_failures: u32,
    /// Delay before retrying the live channel after the poller goes offline.
    pub offline_retry_delay_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.publishing.heartbeat_interval_secs > 0,
            "publishing.heartbeat_interval_secs must be > 0, got {}",
            self.publishing.heartbeat_interval_secs
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.update_interval_secs > 0,
            "monitoring.update_interval_secs must be > 0, got {}",
            self.monitoring.update_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.staleness_window_secs > 0,
            "monitoring.staleness_window_secs must be > 0, got {}",
            self.monitoring.staleness_window_secs
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.client.poll_interval_secs > 0,
            "client.poll_interval_secs must be > 0, got {}",
            self.client.poll_interval_secs
        );
        anyhow::ensure!(
            self.client.staleness_timeout_secs > 0,
            "client.staleness_timeout_secs must be > 0, got {}",
            self.client.staleness_timeout_secs
        );
        anyhow::ensure!(
            self.client.retry_base_ms > 0,
            "client.retry_base_ms must be > 0, got {}",
            self.client.retry_base_ms
        );
        anyhow::ensure!(
            self.client.retry_cap_ms >= self.client.retry_base_ms,
            "client.retry_cap_ms must be >= retry_base_ms, got {} < {}",
            self.client.retry_cap_ms,
            self.client.retry_base_ms
        );
        anyhow::ensure!(
            self.client.max_poll_failures > 0,
            "client.max_poll_failures must be > 0, got {}",
            self.client.max_poll_failures
        );
        anyhow::ensure!(
            self.client.offline_retry_delay_secs > 0,
            "client.offline_retry_delay_secs must be > 0, got {}",
            self.client.offline_retry_delay_secs
        );
        Ok(())
    }
}
