// Server-resident metrics state: single writer (the worker), published to
// readers as immutable MetricsSummary snapshots via watch.

mod milestones;
mod synthetic;

pub use milestones::{Milestone, MilestoneTracker};
pub use synthetic::{MetricsSource, SyntheticSource};

use std::collections::HashSet;

use crate::models::{MetricsSummary, now_ms};

#[derive(Debug, Clone)]
pub struct MetricsState {
    pub total_installs: u64,
    pub active_instances: u64,
    pub p95_latency: f64,
    pub p99_latency: f64,
    pub reliability: f64,
    pub countries: HashSet<String>,
    pub installs_per_hour: u64,
    pub hw_events: u64,
    pub avg_temp: f64,
    last_update: u64,
    seq: u64,
}

impl MetricsState {
    /// Launch-day seed values.
    pub fn seed() -> Self {
        let countries = ["US", "GB", "DE", "JP", "CA", "FR", "AU"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        Self {
            total_installs: 1247,
            active_instances: 1156,
            p95_latency: 187.0,
            p99_latency: 245.0,
            reliability: 99.94,
            countries,
            installs_per_hour: 47,
            hw_events: 12_400,
            avg_temp: 42.0,
            last_update: now_ms(),
            seq: 0,
        }
    }

    /// Advance the publication sequence and update timestamp. Called by the
    /// single writer after each mutation, before the snapshot swap.
    pub fn stamp(&mut self) {
        self.seq += 1;
        self.last_update = now_ms();
    }

    /// Record one discrete install event; returns the new cumulative count.
    pub fn record_install(&mut self, country: Option<&str>) -> u64 {
        self.total_installs += 1;
        if let Some(c) = country {
            self.countries.insert(c.to_owned());
        }
        self.total_installs
    }

    pub fn last_update(&self) -> u64 {
        self.last_update
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Immutable flat projection for the wire (full_update / GET /summary).
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_installs: self.total_installs,
            active_instances: self.active_instances,
            p95_latency: self.p95_latency,
            p99_latency: self.p99_latency,
            reliability: self.reliability,
            countries: self.countries.len() as u32,
            installs_per_hour: self.installs_per_hour,
            hw_events: self.hw_events,
            avg_temp: self.avg_temp,
            last_update: self.last_update,
            seq: self.seq,
        }
    }
}
