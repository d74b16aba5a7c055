use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/cdemu/config.toml` or `~/.config/cdemu/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CDEMU__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub catalog: CatalogSettings,
    pub playback: PlaybackSettings,
    pub device: DeviceSettings,
    pub audio: AudioSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Which playback engine drives the virtual drive.
    pub backend: EngineBackend,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineBackend {
    /// Decode and play through the default output device.
    #[default]
    #[serde(alias = "audio", alias = "default")]
    Rodio,
    /// No output; tracks "play" for their probed duration on the wall clock.
    #[serde(alias = "null", alias = "none", alias = "mute")]
    Silent,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Folder holding `NN.<extension>` files. Relative paths resolve against
    /// the working directory.
    pub music_folder: PathBuf,
    /// Extension of the track files (case-insensitive, without dot).
    pub extension: String,
    /// Number of track slots, including the never-probed slot 0.
    pub max_tracks: usize,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            music_folder: PathBuf::from("tamus"),
            extension: "ogg".to_string(),
            max_tracks: 99,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// How `play ... from F to T` turns into a track range.
    pub range_mode: RangeMode,
    /// Sleep between two engine progress polls (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            range_mode: RangeMode::SingleTrack,
            poll_interval_ms: 50,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeMode {
    /// `to` is accepted but only the `from` track plays.
    #[default]
    #[serde(alias = "single", alias = "single_track", alias = "collapse")]
    SingleTrack,
    /// Play every track from `from` up to the track before `to`.
    #[serde(alias = "range", alias = "multi-track", alias = "multi_track")]
    Span,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Name the device answers to in command strings.
    pub alias: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            alias: "cdaudio".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Music volume in percent, applied through the aux device at startup.
    pub music_volume: u8,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { music_volume: 100 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Write the log to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}
