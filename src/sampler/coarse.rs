// OS-level coarse thermal indicators

use crate::models::ThermalState;

/// Coarse thermal status every platform can answer without permissions.
/// Infallible by contract: implementations return the documented defaults
/// (Unknown / 0) when the OS gives them nothing better.
pub trait CoarseIndicator: Send + Sync {
    fn thermal_state(&self) -> ThermalState;
    fn pressure_level(&self) -> u32;
}

/// Platforms without a coarse thermal API.
pub struct DefaultCoarse;

impl CoarseIndicator for DefaultCoarse {
    fn thermal_state(&self) -> ThermalState {
        ThermalState::Unknown
    }

    fn pressure_level(&self) -> u32 {
        0
    }
}
