// Domain models: thermal snapshots and the live-channel wire protocol

mod snapshot;
mod wire;

pub use snapshot::{HardwareClass, ThermalSnapshot, ThermalState};
pub use wire::{
    HeartbeatData, InstallAck, InstallReport, MetricsSummary, MilestoneData, NewInstallData,
    PushMessage,
};

/// Current time as epoch milliseconds; 0 (with a warning) if the clock is broken.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}
