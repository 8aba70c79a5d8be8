// Per-tick gauge recomputation

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::MetricsState;
use crate::sampler::Sampler;

/// Source of per-tick gauge updates. The default deployment is synthetic;
/// a production deployment would aggregate sampler snapshots across a fleet.
pub trait MetricsSource: Send {
    fn update(&mut self, state: &mut MetricsState);
}

/// Synthetic gauge generator. When given a local sampler, its cpu reading
/// feeds the average-temperature gauge instead of the simulated value.
pub struct SyntheticSource {
    rng: StdRng,
    sampler: Option<Sampler>,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            sampler: None,
        }
    }

    pub fn with_sampler(sampler: Sampler) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            sampler: Some(sampler),
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SyntheticSource {
    fn update(&mut self, state: &mut MetricsState) {
        state.total_installs += self.rng.random_range(0..3);
        state.active_instances = state
            .total_installs
            .saturating_sub(self.rng.random_range(0..100));
        state.p95_latency = 180.0 + self.rng.random::<f64>() * 20.0;
        state.p99_latency = state.p95_latency + 40.0 + self.rng.random::<f64>() * 30.0;
        state.reliability = 99.90 + self.rng.random::<f64>() * 0.08;
        state.installs_per_hour = 40 + self.rng.random_range(0..20);
        state.hw_events += self.rng.random_range(50..150);
        state.avg_temp = match self
            .sampler
            .as_ref()
            .and_then(|s| s.sample().cpu_temperature_c)
        {
            Some(t) => t,
            None => 38.0 + self.rng.random::<f64>() * 8.0,
        };
    }
}
