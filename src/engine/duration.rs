use std::path::Path;

use lofty::file::AudioFile;
use tracing::trace;

/// Read the container duration of `path` in whole seconds.
///
/// Missing or unreadable files report 0, which the catalog treats as an
/// absent track.
pub fn probe_seconds(path: &Path) -> u32 {
    if !path.is_file() {
        return 0;
    }

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            let secs = tagged.properties().duration().as_secs();
            u32::try_from(secs).unwrap_or(u32::MAX)
        }
        Err(e) => {
            trace!(path = %path.display(), error = %e, "duration probe failed");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_has_zero_duration() {
        let dir = tempdir().unwrap();
        assert_eq!(probe_seconds(&dir.path().join("01.ogg")), 0);
    }

    #[test]
    fn garbage_file_has_zero_duration() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("02.ogg");
        fs::write(&path, b"not a real ogg").unwrap();
        assert_eq!(probe_seconds(&path), 0);
    }

    #[test]
    fn directory_has_zero_duration() {
        let dir = tempdir().unwrap();
        assert_eq!(probe_seconds(dir.path()), 0);
    }
}
