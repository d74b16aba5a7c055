use std::path::{Path, PathBuf};

/// Tracks shorter than this are treated as missing.
pub const MIN_PLAYABLE_SECONDS: u32 = 4;
/// Disc time consumed by a missing (data) track.
pub const DATA_TRACK_SECONDS: u32 = 4;

/// One disc track slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackEntry {
    /// Backing file, `None` for an absent (data) slot.
    pub path: Option<PathBuf>,
    /// Probed length in seconds.
    pub length: u32,
    /// Disc-relative start in seconds.
    pub position: u32,
}

impl TrackEntry {
    pub fn is_present(&self) -> bool {
        self.path.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSummary {
    /// Track count reported to clients.
    pub total: u32,
    pub first_present: Option<usize>,
    pub last_present: Option<usize>,
}

/// The emulated disc: slot 0 is the never-probed data slot, slots `1..`
/// come from the music folder.
#[derive(Debug, Clone)]
pub struct Catalog {
    tracks: Vec<TrackEntry>,
    summary: CatalogSummary,
}

impl Catalog {
    pub fn summary(&self) -> CatalogSummary {
        self.summary
    }

    pub fn get(&self, track: usize) -> Option<&TrackEntry> {
        self.tracks.get(track)
    }

    /// Number of slots including slot 0.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.first_present.is_none()
    }

    /// Present tracks with their slot numbers, in disc order.
    pub fn present(&self) -> impl Iterator<Item = (usize, &TrackEntry)> {
        self.tracks.iter().enumerate().filter(|(_, t)| t.is_present())
    }

    /// Clamp `track` into `[first_present, last_present]`; 0 on a disc
    /// without audio.
    pub fn clamp(&self, track: usize) -> usize {
        match (self.summary.first_present, self.summary.last_present) {
            (Some(first), Some(last)) => track.clamp(first, last),
            _ => 0,
        }
    }

    /// The present track starting exactly at `seconds` on the disc.
    pub fn present_at(&self, seconds: u32) -> Option<usize> {
        self.present()
            .find(|(_, t)| t.position == seconds)
            .map(|(i, _)| i)
    }

    /// Disc length in seconds: end of the last present track.
    pub fn disc_length(&self) -> u32 {
        self.summary
            .last_present
            .and_then(|i| self.get(i))
            .map_or(0, |t| t.position + t.length)
    }
}

/// Accumulates probed slots in order and keeps the disc accounting.
#[derive(Debug)]
pub struct CatalogBuilder {
    tracks: Vec<TrackEntry>,
    position: u32,
    total: u32,
    first_present: Option<usize>,
    last_present: Option<usize>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            tracks: vec![TrackEntry::default()],
            position: 0,
            // Mixed-mode discs carry a leading data track.
            total: 1,
            first_present: None,
            last_present: None,
        }
    }

    /// Append the next slot, backed by `path` with a probed `length`.
    pub fn push(&mut self, path: PathBuf, length: u32) -> &TrackEntry {
        let slot = self.tracks.len();
        let position = self.position;

        let entry = if length < MIN_PLAYABLE_SECONDS {
            self.position += DATA_TRACK_SECONDS;
            TrackEntry {
                path: None,
                length,
                position,
            }
        } else {
            if self.first_present.is_none() {
                self.first_present = Some(slot);
                // A disc that opens with audio at the assumed count position
                // has no leading data track to report.
                if slot as u32 == self.total {
                    self.total -= 1;
                }
            }
            self.total += 1;
            self.last_present = Some(slot);
            self.position += length;
            TrackEntry {
                path: Some(path),
                length,
                position,
            }
        };

        self.tracks.push(entry);
        &self.tracks[slot]
    }

    pub fn finish(self) -> Catalog {
        Catalog {
            tracks: self.tracks,
            summary: CatalogSummary {
                total: self.total,
                first_present: self.first_present,
                last_present: self.last_present,
            },
        }
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}
