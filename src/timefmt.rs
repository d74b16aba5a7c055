//! Disc time encodings.
//!
//! Only track resolution is honoured: packed minute/second/frame fields are
//! dropped on decode and reported as zero on encode.

use tracing::trace;

use crate::catalog::Catalog;
use crate::mci;

/// Time format selected with `set ... time format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    Milliseconds,
    Msf,
    #[default]
    Tmsf,
    /// Any other protocol format; values are taken as raw track numbers.
    Other(u32),
}

impl TimeFormat {
    pub fn from_code(code: u32) -> Self {
        match code {
            mci::MCI_FORMAT_MILLISECONDS => TimeFormat::Milliseconds,
            mci::MCI_FORMAT_MSF => TimeFormat::Msf,
            mci::MCI_FORMAT_TMSF => TimeFormat::Tmsf,
            other => TimeFormat::Other(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            TimeFormat::Milliseconds => mci::MCI_FORMAT_MILLISECONDS,
            TimeFormat::Msf => mci::MCI_FORMAT_MSF,
            TimeFormat::Tmsf => mci::MCI_FORMAT_TMSF,
            TimeFormat::Other(code) => code,
        }
    }

    /// Keyword accepted by `set <alias> time format <keyword>`.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "milliseconds" | "ms" => Some(TimeFormat::Milliseconds),
            "msf" => Some(TimeFormat::Msf),
            "tmsf" => Some(TimeFormat::Tmsf),
            _ => None,
        }
    }

    /// Name used in textual status replies.
    pub fn name(self) -> &'static str {
        match self.code() {
            mci::MCI_FORMAT_MILLISECONDS => "milliseconds",
            mci::MCI_FORMAT_HMS => "hms",
            mci::MCI_FORMAT_MSF => "msf",
            mci::MCI_FORMAT_FRAMES => "frames",
            mci::MCI_FORMAT_BYTES => "bytes",
            mci::MCI_FORMAT_SAMPLES => "samples",
            mci::MCI_FORMAT_TMSF => "tmsf",
            _ => "unknown",
        }
    }
}

/// Track addressed by `value`, before clamping.
///
/// Milliseconds select the present track starting exactly at that second;
/// without an exact match the result is track 0.
pub fn decode_track(format: TimeFormat, value: u32, catalog: &Catalog) -> usize {
    match format {
        TimeFormat::Tmsf => {
            let minute = mci::tmsf_minute(value);
            let second = mci::tmsf_second(value);
            let frame = mci::tmsf_frame(value);
            if minute + second + frame > 0 {
                trace!(minute, second, frame, "sub-track position ignored");
            }
            mci::tmsf_track(value) as usize
        }
        TimeFormat::Milliseconds => catalog.present_at(value / 1000).unwrap_or(0),
        TimeFormat::Msf | TimeFormat::Other(_) => value as usize,
    }
}

/// Last track played when `value` is an end position, before clamping.
///
/// An end on a track boundary stops before that track; an end inside a
/// track (non-zero TMSF sub-track fields, or a millisecond value past a
/// track start) keeps it.
pub fn decode_end_track(format: TimeFormat, value: u32, catalog: &Catalog) -> usize {
    match format {
        TimeFormat::Tmsf => {
            let track = mci::tmsf_track(value) as usize;
            let within =
                mci::tmsf_minute(value) + mci::tmsf_second(value) + mci::tmsf_frame(value);
            if within == 0 {
                track.saturating_sub(1)
            } else {
                track
            }
        }
        TimeFormat::Milliseconds => {
            let seconds = value / 1000;
            catalog
                .present()
                .filter(|(_, t)| t.position < seconds)
                .map(|(i, _)| i)
                .last()
                .unwrap_or(0)
        }
        TimeFormat::Msf | TimeFormat::Other(_) => (value as usize).saturating_sub(1),
    }
}

/// Track addressed by `value`, clamped to the present tracks.
pub fn resolve_track(format: TimeFormat, value: u32, catalog: &Catalog) -> usize {
    catalog.clamp(decode_track(format, value, catalog))
}

/// Last track of a range ending at `value`, clamped to the present tracks.
pub fn resolve_end_track(format: TimeFormat, value: u32, catalog: &Catalog) -> usize {
    catalog.clamp(decode_end_track(format, value, catalog))
}

/// Encode the start of `track` for a status reply.
pub fn encode_position(format: TimeFormat, track: usize, catalog: &Catalog) -> u32 {
    match format {
        TimeFormat::Tmsf => mci::make_tmsf(track as u32, 0, 0, 0),
        TimeFormat::Milliseconds => catalog
            .get(track)
            .map_or(0, |t| t.position.saturating_mul(1000)),
        TimeFormat::Msf | TimeFormat::Other(_) => track as u32,
    }
}

/// Encode a duration of `seconds` for a status reply.
pub fn encode_length(format: TimeFormat, seconds: u32) -> u32 {
    match format {
        TimeFormat::Milliseconds => seconds.saturating_mul(1000),
        TimeFormat::Tmsf | TimeFormat::Msf => mci::make_msf(seconds / 60, seconds % 60, 0),
        TimeFormat::Other(_) => seconds,
    }
}
