//! The auxiliary CD-audio volume device that accompanies the drive.

use parking_lot::Mutex;
use tracing::debug;

use crate::engine::SharedEngine;
use crate::mci;

/// Creative Labs.
pub const MANUFACTURER_ID: u16 = 2;
/// Creative aux CD.
pub const PRODUCT_ID: u16 = 401;
pub const DRIVER_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxTechnology {
    CdAudio,
}

/// Capabilities reported for the single aux device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxCaps {
    pub manufacturer_id: u16,
    pub product_id: u16,
    pub driver_version: u32,
    pub name: String,
    pub technology: AuxTechnology,
    pub supports_volume: bool,
}

/// Aux volume control mapped onto the playback engine volume.
pub struct AuxDevice {
    engine: SharedEngine,
    last: Mutex<Option<u32>>,
}

impl AuxDevice {
    pub fn new(engine: SharedEngine) -> Self {
        Self {
            engine,
            last: Mutex::new(None),
        }
    }

    pub fn num_devs(&self) -> u32 {
        1
    }

    pub fn caps(&self) -> AuxCaps {
        AuxCaps {
            manufacturer_id: MANUFACTURER_ID,
            product_id: PRODUCT_ID,
            driver_version: DRIVER_VERSION,
            name: mci::PRODUCT_NAME.to_string(),
            technology: AuxTechnology::CdAudio,
            supports_volume: true,
        }
    }

    /// Last packed volume applied, 0 before the first set.
    pub fn volume(&self) -> u32 {
        self.last.lock().unwrap_or(0)
    }

    /// Apply a packed volume: left channel in the low word, right channel in
    /// the high word. Only the left channel drives the engine, and repeating
    /// the last value is a no-op.
    pub fn set_volume(&self, packed: u32) {
        {
            let mut last = self.last.lock();
            if *last == Some(packed) {
                return;
            }
            *last = Some(packed);
        }

        let left = packed & 0xFFFF;
        let percent = left_percent(left);
        debug!(
            packed = format_args!("{packed:#010x}"),
            left,
            right = packed >> 16,
            percent,
            "aux volume"
        );
        self.engine.lock().set_volume(percent);
    }

    /// Set both channels from a percentage.
    pub fn set_percent(&self, percent: u8) {
        self.set_volume(pack_percent(percent));
    }
}

fn left_percent(left: u32) -> u8 {
    (left as f32 / 65535.0 * 100.0).round().min(100.0) as u8
}

/// Packed two-channel volume for `percent` (clamped to 100).
pub fn pack_percent(percent: u8) -> u32 {
    let channel = (u32::from(percent.min(100)) * 0xFFFF + 50) / 100;
    channel | (channel << 16)
}
