// Thermal snapshot models

use serde::{Deserialize, Serialize};

/// What the running machine exposes: per-component sensors (ClassA),
/// coarse indicators only (ClassB, typically unified-memory hardware),
/// or nothing we recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HardwareClass {
    ClassA,
    ClassB,
    Unknown,
}

/// OS-level coarse thermal indicator; available on all hardware without
/// special permission. Serializes to the OS-facing strings ("Nominal", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThermalState {
    Nominal,
    Fair,
    Serious,
    Critical,
    Unknown,
}

impl Default for ThermalState {
    fn default() -> Self {
        ThermalState::Unknown
    }
}

/// Best-effort thermal reading, created fresh per sample, never mutated.
/// Every field has a safe default; `ok` is always true by construction and
/// `diagnostic` carries a human-readable note when a source degraded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermalSnapshot {
    pub cpu_temperature_c: Option<f64>,
    /// Absent on unified-memory hardware by design.
    pub gpu_temperature_c: Option<f64>,
    /// Empty on fanless or managed-fan hardware.
    pub fan_speeds_rpm: Vec<f64>,
    pub thermal_state: ThermalState,
    pub thermal_pressure_level: u32,
    pub hardware_class: HardwareClass,
    /// Epoch milliseconds.
    pub captured_at: u64,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}
