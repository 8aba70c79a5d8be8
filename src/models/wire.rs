// Live-channel wire protocol: push envelope, summary projection, install ingestion

use serde::{Deserialize, Serialize};

/// Flat projection of the server-resident metrics state. One GET /summary
/// response (or one `full_update` push) fully reconstructs client state;
/// `seq` is monotonic so clients can discard out-of-order updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub total_installs: u64,
    pub active_instances: u64,
    pub p95_latency: f64,
    pub p99_latency: f64,
    pub reliability: f64,
    /// Country-set cardinality.
    pub countries: u32,
    pub installs_per_hour: u64,
    pub hw_events: u64,
    pub avg_temp: f64,
    /// Epoch milliseconds of the last internal update.
    pub last_update: u64,
    pub seq: u64,
}

/// Push message envelope: `{"type": "...", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushMessage {
    Heartbeat(HeartbeatData),
    NewInstall(NewInstallData),
    Milestone(MilestoneData),
    FullUpdate(MetricsSummary),
}

/// Small fixed subset of gauges for the live-counter animation; deliberately
/// not a full snapshot to bound per-tick payload size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatData {
    pub active_instances: u64,
    pub p95_latency: f64,
    pub installs_per_hour: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstallData {
    pub global_installs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneData {
    pub threshold: u64,
    pub message: String,
    pub installs: u64,
    pub p95_latency: f64,
    pub reliability: f64,
}

/// POST /install body: discrete install event, all fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallReport {
    pub country: Option<String>,
    pub version: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallAck {
    pub success: bool,
    pub total_installs: u64,
}
