// Sensor sampler: hardware class detection, per-source readers, degrade policy.
// sample() never fails; every failure path resolves to a populated snapshot
// with defaults and a diagnostic note.

mod coarse;
mod component_source;
mod source;

pub use coarse::{CoarseIndicator, DefaultCoarse};
pub use component_source::ComponentSource;
pub use source::{
    KEY_CPU_PROXIMITY, KEY_FAN0_ACTUAL, KEY_FAN1_ACTUAL, KEY_GPU_PROXIMITY, KeyInfo, SensorError,
    SensorHandle, SensorKey, SensorSource, decode_rpm, decode_temperature, read_key,
};

use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

use crate::models::{HardwareClass, ThermalSnapshot, ThermalState, now_ms};

/// Classify a platform identifier string by substring match.
pub fn classify(identifier: &str) -> HardwareClass {
    let id = identifier.to_lowercase();
    if id.contains("arm64") || id.contains("aarch64") || id.contains("apple") {
        HardwareClass::ClassB
    } else if id.contains("x86_64") || id.contains("amd64") || id.contains("x86") {
        HardwareClass::ClassA
    } else {
        HardwareClass::Unknown
    }
}

static DETECTED_CLASS: OnceLock<HardwareClass> = OnceLock::new();

/// Detected once per process; immutable after detection.
pub fn detect_hardware_class() -> HardwareClass {
    *DETECTED_CLASS.get_or_init(|| {
        let arch = sysinfo::System::cpu_arch();
        let class = classify(&arch);
        tracing::info!(identifier = %arch, ?class, "hardware class detected");
        class
    })
}

/// Affine estimate for sensor-hidden hardware, clamped to a plausible range.
pub fn estimate_cpu_temperature(pressure_level: u32) -> f64 {
    (40.0 + f64::from(pressure_level) * 15.0).clamp(40.0, 100.0)
}

struct Inner {
    class: HardwareClass,
    source: Arc<dyn SensorSource>,
    coarse: Arc<dyn CoarseIndicator>,
}

/// Best-effort thermal sampler over a sensor source and a coarse indicator.
/// Synchronous and lock-free; each sample performs its own scoped
/// acquire/release of the sensor handle.
pub struct Sampler {
    inner: Arc<Inner>,
    monitor: Option<tokio::task::JoinHandle<()>>,
}

impl Sampler {
    pub fn new(source: Arc<dyn SensorSource>, coarse: Arc<dyn CoarseIndicator>) -> Self {
        Self::with_class(detect_hardware_class(), source, coarse)
    }

    /// Fixed hardware class (tests, or callers that detect out of band).
    pub fn with_class(
        class: HardwareClass,
        source: Arc<dyn SensorSource>,
        coarse: Arc<dyn CoarseIndicator>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                class,
                source,
                coarse,
            }),
            monitor: None,
        }
    }

    pub fn hardware_class(&self) -> HardwareClass {
        self.inner.class
    }

    pub fn sample(&self) -> ThermalSnapshot {
        self.inner.sample()
    }

    /// Monitoring mode: fires `on_change` with a fresh sample on every
    /// coarse-state transition reported on `changes`. Not a polling loop.
    /// At most one active registration per sampler; a second start is a no-op.
    pub fn start_monitoring<F>(&mut self, mut changes: watch::Receiver<ThermalState>, on_change: F)
    where
        F: Fn(ThermalSnapshot) + Send + Sync + 'static,
    {
        if self.monitor.is_some() {
            tracing::warn!("thermal monitoring already active, ignoring start");
            return;
        }
        let inner = self.inner.clone();
        self.monitor = Some(tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let snapshot = inner.sample();
                tracing::info!(
                    state = ?snapshot.thermal_state,
                    pressure = snapshot.thermal_pressure_level,
                    "thermal state changed"
                );
                on_change(snapshot);
            }
        }));
    }

    /// Idempotent; safe to call without a prior start_monitoring.
    pub fn stop_monitoring(&mut self) {
        if let Some(handle) = self.monitor.take() {
            handle.abort();
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

impl Inner {
    fn sample(&self) -> ThermalSnapshot {
        // Coarse indicators are read on every branch; they never fail to
        // produce at least Unknown / 0.
        let thermal_state = self.coarse.thermal_state();
        let pressure = self.coarse.pressure_level();

        let mut cpu = None;
        let mut gpu = None;
        let mut fans = Vec::new();
        let mut diagnostic = None;

        match self.class {
            HardwareClass::ClassA => match self.source.acquire() {
                Ok(mut handle) => {
                    cpu = read_key(&mut *handle, KEY_CPU_PROXIMITY)
                        .as_deref()
                        .and_then(decode_temperature);
                    gpu = read_key(&mut *handle, KEY_GPU_PROXIMITY)
                        .as_deref()
                        .and_then(decode_temperature);
                    for key in [KEY_FAN0_ACTUAL, KEY_FAN1_ACTUAL] {
                        if let Some(rpm) = read_key(&mut *handle, key).as_deref().and_then(decode_rpm)
                        {
                            fans.push(rpm);
                        }
                    }
                    if cpu.is_none() && gpu.is_none() && fans.is_empty() {
                        diagnostic = Some("no per-component sensor responded".into());
                    }
                    // Handle released here on drop, on every path.
                }
                Err(e) => {
                    tracing::warn!(error = %e, "sensor acquire failed, coarse indicators only");
                    diagnostic = Some(format!("sensor service unavailable: {e}"));
                }
            },
            HardwareClass::ClassB => {
                // No per-component reads on sensor-hidden hardware.
                cpu = Some(estimate_cpu_temperature(pressure));
                diagnostic = Some("cpu temperature estimated from thermal pressure".into());
            }
            HardwareClass::Unknown => {
                diagnostic = Some("limited to system thermal state only".into());
            }
        }

        ThermalSnapshot {
            cpu_temperature_c: cpu,
            gpu_temperature_c: gpu,
            fan_speeds_rpm: fans,
            thermal_state,
            thermal_pressure_level: pressure,
            hardware_class: self.class,
            captured_at: now_ms(),
            ok: true,
            diagnostic,
        }
    }
}
