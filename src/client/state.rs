// Client-side dashboard state: one always-populated view of the metrics,
// regardless of which transport is currently driving updates.

use std::collections::{BTreeSet, VecDeque};

use crate::models::{MetricsSummary, PushMessage, now_ms};

/// Bounded p95 history for sparkline-style rendering.
const LATENCY_HISTORY_POINTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Live,
    /// Transport up (or polling), but data may be stale.
    Degraded,
    Offline,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub total_installs: u64,
    pub active_instances: u64,
    pub p95_latency: f64,
    pub p99_latency: f64,
    pub reliability: f64,
    /// Countries seen in install events; the server-reported cardinality may
    /// run ahead of this set.
    pub countries: BTreeSet<String>,
    pub country_count: u32,
    pub installs_per_hour: u64,
    pub hw_events: u64,
    pub avg_temp: f64,
    /// (timestamp ms, p95) pairs, most recent last.
    pub latency_history: VecDeque<(u64, f64)>,
    /// Timestamp of the most recently applied data (server time when the
    /// update carried one, local arrival time otherwise).
    pub last_update: u64,
    /// Server publication sequence of the last applied full snapshot.
    pub seq: u64,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one push message in arrival order. Returns true when visible
    /// state changed.
    pub fn apply_push(&mut self, msg: &PushMessage) -> bool {
        match msg {
            PushMessage::Heartbeat(h) => {
                self.active_instances = h.active_instances;
                self.p95_latency = h.p95_latency.max(0.0);
                self.installs_per_hour = h.installs_per_hour;
                self.latency_history.push_back((now_ms(), self.p95_latency));
                while self.latency_history.len() > LATENCY_HISTORY_POINTS {
                    self.latency_history.pop_front();
                }
                self.last_update = now_ms();
                true
            }
            PushMessage::NewInstall(n) => {
                // The counter never goes backwards, even if the event lost a
                // race with a fuller update.
                self.total_installs = (self.total_installs + 1).max(n.global_installs);
                if let Some(c) = &n.country {
                    self.countries.insert(c.clone());
                }
                self.country_count = self.country_count.max(self.countries.len() as u32);
                self.last_update = now_ms();
                true
            }
            PushMessage::Milestone(m) => {
                tracing::info!(
                    threshold = m.threshold,
                    message = %m.message,
                    installs = m.installs,
                    "milestone achieved"
                );
                self.total_installs = self.total_installs.max(m.installs);
                self.last_update = now_ms();
                true
            }
            PushMessage::FullUpdate(s) => self.apply_summary(s),
        }
    }

    /// Overwrite from a full snapshot. Snapshots older than the applied one
    /// are discarded so a late pull can never roll back a newer push.
    /// Returns true when applied.
    pub fn apply_summary(&mut self, s: &MetricsSummary) -> bool {
        if s.seq < self.seq {
            tracing::debug!(
                incoming_seq = s.seq,
                applied_seq = self.seq,
                "discarding stale snapshot"
            );
            return false;
        }
        self.seq = s.seq;
        self.total_installs = self.total_installs.max(s.total_installs);
        self.active_instances = s.active_instances;
        self.p95_latency = s.p95_latency.max(0.0);
        self.p99_latency = s.p99_latency.max(0.0);
        self.reliability = s.reliability.clamp(0.0, 100.0);
        self.installs_per_hour = s.installs_per_hour;
        self.hw_events = s.hw_events;
        self.avg_temp = s.avg_temp;
        self.country_count = s.countries.max(self.countries.len() as u32);
        self.last_update = s.last_update;
        true
    }
}
