use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::CatalogSettings;
use crate::engine::PlaybackEngine;

use super::model::{Catalog, CatalogBuilder};

fn normalized_extension(settings: &CatalogSettings) -> String {
    settings
        .extension
        .trim()
        .trim_start_matches('.')
        .to_ascii_lowercase()
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|e| e.to_ascii_lowercase() == ext)
        .unwrap_or(false)
}

/// Slot number encoded in a two-digit file stem (`07.ogg` -> 7).
fn slot_number(path: &Path) -> Option<usize> {
    let stem = path.file_stem()?.to_str()?;
    if stem.len() == 2 && stem.bytes().all(|b| b.is_ascii_digit()) {
        stem.parse().ok()
    } else {
        None
    }
}

/// Map slot numbers to the files present in `dir` (top level only).
fn slot_files(dir: &Path, ext: &str) -> HashMap<usize, PathBuf> {
    let mut files = HashMap::new();

    for entry in WalkDir::new(dir)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || !has_extension(path, ext) {
            continue;
        }
        if let Some(slot) = slot_number(path) {
            files.entry(slot).or_insert_with(|| path.to_path_buf());
        }
    }

    files
}

impl Catalog {
    /// Probe `dir` for `01.<ext>` .. and build the disc table.
    ///
    /// Missing or unplayable files become data slots; probing never fails.
    pub fn build(dir: &Path, settings: &CatalogSettings, engine: &dyn PlaybackEngine) -> Catalog {
        let ext = normalized_extension(settings);
        let files = slot_files(dir, &ext);

        debug!(dir = %dir.display(), found = files.len(), "searching tracks");

        let mut builder = CatalogBuilder::new();
        for slot in 1..settings.max_tracks {
            let path = files
                .get(&slot)
                .cloned()
                .unwrap_or_else(|| dir.join(format!("{slot:02}.{ext}")));
            let length = engine.query_duration(&path);
            let entry = builder.push(path, length);
            if entry.is_present() {
                debug!(
                    "track {:02}: {:02}:{:02} @ {} seconds",
                    slot,
                    entry.length / 60,
                    entry.length % 60,
                    entry.position
                );
            }
        }

        let catalog = builder.finish();
        info!(
            total = catalog.summary().total,
            first = ?catalog.summary().first_present,
            last = ?catalog.summary().last_present,
            "emulating CD tracks from {}",
            dir.display()
        );
        catalog
    }
}
