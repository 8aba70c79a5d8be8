// sysinfo-backed sensor source

use sysinfo::Components;

use super::source::{
    KEY_CPU_PROXIMITY, KEY_GPU_PROXIMITY, KeyInfo, SensorError, SensorHandle, SensorKey,
    SensorSource,
};

/// Fixed-point temperature type code reported in key metadata.
const TYPE_FIXED_POINT: u32 = u32::from_be_bytes(*b"sp78");

/// Adapts sysinfo's component temperatures to the two-phase sensor
/// interface, so the shared decode path runs against real hardware.
/// Fan keys report missing: sysinfo exposes no fan telemetry.
pub struct ComponentSource;

impl SensorSource for ComponentSource {
    fn acquire(&self) -> Result<Box<dyn SensorHandle + '_>, SensorError> {
        let components = Components::new_with_refreshed_list();
        if components.list().is_empty() {
            return Err(SensorError::Unavailable(
                "no temperature components exposed".into(),
            ));
        }
        Ok(Box::new(ComponentHandle { components }))
    }
}

struct ComponentHandle {
    components: Components,
}

impl ComponentHandle {
    fn temperature_for(&self, key: SensorKey) -> Option<f32> {
        let needle = match key {
            KEY_CPU_PROXIMITY => "cpu",
            KEY_GPU_PROXIMITY => "gpu",
            _ => return None,
        };
        self.components
            .list()
            .iter()
            .filter(|c| c.label().to_lowercase().contains(needle))
            .find_map(|c| c.temperature())
    }
}

impl SensorHandle for ComponentHandle {
    fn key_info(&mut self, key: SensorKey) -> Result<KeyInfo, SensorError> {
        if self.temperature_for(key).is_none() {
            return Err(SensorError::MissingKey(key));
        }
        Ok(KeyInfo {
            data_size: 2,
            data_type: TYPE_FIXED_POINT,
        })
    }

    fn read_bytes(&mut self, key: SensorKey, _info: &KeyInfo) -> Result<Vec<u8>, SensorError> {
        let celsius = self
            .temperature_for(key)
            .ok_or(SensorError::MissingKey(key))?;
        // Re-encode as big-endian fixed point (raw = degrees * 256).
        let raw = (f64::from(celsius.max(0.0)) * 256.0).round() as u32;
        let raw = raw.min(u32::from(u16::MAX)) as u16;
        Ok(raw.to_be_bytes().to_vec())
    }
}
