// Platform sensor service seam: scoped handles and two-phase key reads

use thiserror::Error;

/// Four-character sensor key, addressed as a packed big-endian code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorKey(pub [u8; 4]);

pub const KEY_CPU_PROXIMITY: SensorKey = SensorKey(*b"TC0P");
pub const KEY_GPU_PROXIMITY: SensorKey = SensorKey(*b"TG0P");
pub const KEY_FAN0_ACTUAL: SensorKey = SensorKey(*b"F0Ac");
pub const KEY_FAN1_ACTUAL: SensorKey = SensorKey(*b"F1Ac");

impl SensorKey {
    pub fn code(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl std::fmt::Display for SensorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor service unavailable: {0}")]
    Unavailable(String),
    #[error("key {0} not present")]
    MissingKey(SensorKey),
    #[error("read failed for {key}: {reason}")]
    ReadFailed { key: SensorKey, reason: String },
}

/// Key metadata from the first phase of a read.
#[derive(Debug, Clone, Copy)]
pub struct KeyInfo {
    pub data_size: u32,
    pub data_type: u32,
}

/// Scoped access to the platform sensor service. Acquisition is per sample;
/// the handle is released on drop, which covers every exit path.
pub trait SensorSource: Send + Sync {
    fn acquire(&self) -> Result<Box<dyn SensorHandle + '_>, SensorError>;
}

/// Two-phase read: query key metadata, then read raw bytes.
pub trait SensorHandle {
    fn key_info(&mut self, key: SensorKey) -> Result<KeyInfo, SensorError>;
    fn read_bytes(&mut self, key: SensorKey, info: &KeyInfo) -> Result<Vec<u8>, SensorError>;
}

/// Big-endian fixed-point temperature: whole degrees = raw / 256.
pub fn decode_temperature(bytes: &[u8]) -> Option<f64> {
    let raw = u16::from_be_bytes([*bytes.first()?, *bytes.get(1)?]);
    Some(f64::from(raw) / 256.0)
}

/// Big-endian unsigned fan speed in RPM.
pub fn decode_rpm(bytes: &[u8]) -> Option<f64> {
    let raw = u16::from_be_bytes([*bytes.first()?, *bytes.get(1)?]);
    Some(f64::from(raw))
}

/// Two-phase read of one key. Soft-fails to None on any error, and when the
/// reported metadata is shorter than the fixed 2-byte decode expects.
pub fn read_key(handle: &mut dyn SensorHandle, key: SensorKey) -> Option<Vec<u8>> {
    let info = match handle.key_info(key) {
        Ok(info) => info,
        Err(e) => {
            tracing::debug!(key = %key, error = %e, "sensor key info failed");
            return None;
        }
    };
    if info.data_size < 2 {
        tracing::warn!(
            key = %key,
            data_size = info.data_size,
            "sensor key reports short data, skipping"
        );
        return None;
    }
    match handle.read_bytes(key, &info) {
        Ok(bytes) if bytes.len() >= 2 => Some(bytes),
        Ok(bytes) => {
            tracing::warn!(key = %key, len = bytes.len(), "sensor returned short payload");
            None
        }
        Err(e) => {
            tracing::debug!(key = %key, error = %e, "sensor read failed");
            None
        }
    }
}
