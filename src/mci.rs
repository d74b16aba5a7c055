//! Numeric constants of the MCI CD-audio protocol.
//!
//! Values match the ones clients were compiled against, so replies and
//! packed time values are bit-identical to what a physical drive reports.

use bitflags::bitflags;

/// Device id handed out for the single virtual drive.
pub const MAGIC_DEVICE_ID: u32 = 0xBEEF;
/// Device ids that address "the default device".
pub const WILDCARD_DEVICE_IDS: [u32; 2] = [0, 0xFFFF_FFFF];

/// Product name reported through the aux and info queries.
pub const PRODUCT_NAME: &str = "virtual CD";

// Command messages.
pub const MCI_OPEN: u32 = 0x0803;
pub const MCI_CLOSE: u32 = 0x0804;
pub const MCI_PLAY: u32 = 0x0806;
pub const MCI_SEEK: u32 = 0x0807;
pub const MCI_STOP: u32 = 0x0808;
pub const MCI_PAUSE: u32 = 0x0809;
pub const MCI_INFO: u32 = 0x080A;
pub const MCI_GETDEVCAPS: u32 = 0x080B;
pub const MCI_SET: u32 = 0x080D;
pub const MCI_SYSINFO: u32 = 0x0810;
pub const MCI_STATUS: u32 = 0x0814;
pub const MCI_RESUME: u32 = 0x0855;

bitflags! {
    /// Command flags (`fdwCommand`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CommandFlags: u32 {
        const NOTIFY = 0x0000_0001;
        const WAIT = 0x0000_0002;
        const FROM = 0x0000_0004;
        const TO = 0x0000_0008;
        const TRACK = 0x0000_0010;
        const STATUS_ITEM = 0x0000_0100;
        const SET_TIME_FORMAT = 0x0000_0400;
    }
}

// Time formats.
pub const MCI_FORMAT_MILLISECONDS: u32 = 0;
pub const MCI_FORMAT_HMS: u32 = 1;
pub const MCI_FORMAT_MSF: u32 = 2;
pub const MCI_FORMAT_FRAMES: u32 = 3;
pub const MCI_FORMAT_BYTES: u32 = 8;
pub const MCI_FORMAT_SAMPLES: u32 = 9;
pub const MCI_FORMAT_TMSF: u32 = 10;

// Status items.
pub const MCI_STATUS_LENGTH: u32 = 0x01;
pub const MCI_STATUS_POSITION: u32 = 0x02;
pub const MCI_STATUS_NUMBER_OF_TRACKS: u32 = 0x03;
pub const MCI_STATUS_MODE: u32 = 0x04;
pub const MCI_STATUS_MEDIA_PRESENT: u32 = 0x05;
pub const MCI_STATUS_TIME_FORMAT: u32 = 0x06;
pub const MCI_STATUS_READY: u32 = 0x07;
pub const MCI_STATUS_CURRENT_TRACK: u32 = 0x08;
pub const MCI_CDA_STATUS_TYPE_TRACK: u32 = 0x4001;

// Device modes.
pub const MCI_MODE_NOT_READY: u32 = 524;
pub const MCI_MODE_STOP: u32 = 525;
pub const MCI_MODE_PLAY: u32 = 526;
pub const MCI_MODE_PAUSE: u32 = 529;
pub const MCI_MODE_OPEN: u32 = 530;

// Track types.
pub const MCI_CDA_TRACK_AUDIO: u32 = 1088;
pub const MCI_CDA_TRACK_OTHER: u32 = 1089;

// Notification statuses.
pub const MCI_NOTIFY_SUCCESSFUL: u32 = 0x0001;
pub const MCI_NOTIFY_SUPERSEDED: u32 = 0x0002;
pub const MCI_NOTIFY_ABORTED: u32 = 0x0004;

// Errors.
pub const MCIERR_BASE: u32 = 256;
pub const MCIERR_UNRECOGNIZED_KEYWORD: u32 = MCIERR_BASE + 3;
pub const MCIERR_UNRECOGNIZED_COMMAND: u32 = MCIERR_BASE + 5;
pub const MCIERR_INVALID_DEVICE_NAME: u32 = MCIERR_BASE + 7;

pub fn tmsf_track(v: u32) -> u32 {
    v & 0xFF
}

pub fn tmsf_minute(v: u32) -> u32 {
    (v >> 8) & 0xFF
}

pub fn tmsf_second(v: u32) -> u32 {
    (v >> 16) & 0xFF
}

pub fn tmsf_frame(v: u32) -> u32 {
    (v >> 24) & 0xFF
}

pub fn make_tmsf(track: u32, minute: u32, second: u32, frame: u32) -> u32 {
    (track & 0xFF) | ((minute & 0xFF) << 8) | ((second & 0xFF) << 16) | ((frame & 0xFF) << 24)
}

pub fn make_msf(minute: u32, second: u32, frame: u32) -> u32 {
    (minute & 0xFF) | ((second & 0xFF) << 8) | ((frame & 0xFF) << 16)
}
