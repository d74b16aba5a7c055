use std::path::Path;
use std::time::{Duration, Instant};

use super::{PlaybackEngine, Progress, probe_seconds};
use crate::error::EngineError;

/// Engine without audio output.
///
/// A loaded track counts as playing for its probed length on the wall
/// clock, excluding time spent paused. Useful on headless machines and for
/// exercising clients without sound.
#[derive(Debug, Default)]
pub struct SilentEngine {
    track: Option<SilentTrack>,
}

#[derive(Debug)]
struct SilentTrack {
    length: Duration,
    played: Duration,
    resumed_at: Option<Instant>,
}

impl SilentTrack {
    fn elapsed(&self) -> Duration {
        self.played + self.resumed_at.map_or(Duration::ZERO, |t| t.elapsed())
    }
}

impl SilentEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaybackEngine for SilentEngine {
    fn init(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn release(&mut self) {
        self.track = None;
    }

    fn open(&mut self, path: &Path) {
        let length = probe_seconds(path);
        self.track = (length > 0).then(|| SilentTrack {
            length: Duration::from_secs(u64::from(length)),
            played: Duration::ZERO,
            resumed_at: Some(Instant::now()),
        });
    }

    fn start(&mut self) {
        if let Some(t) = &mut self.track {
            if t.resumed_at.is_none() {
                t.resumed_at = Some(Instant::now());
            }
        }
    }

    fn pause(&mut self) {
        if let Some(t) = &mut self.track {
            if let Some(at) = t.resumed_at.take() {
                t.played += at.elapsed();
            }
        }
    }

    fn stop(&mut self) {
        self.track = None;
    }

    fn set_volume(&mut self, _percent: u8) {}

    fn query_duration(&self, path: &Path) -> u32 {
        probe_seconds(path)
    }

    fn poll_progress(&mut self) -> Progress {
        let finished = self.track.as_ref().is_none_or(|t| t.elapsed() >= t.length);
        if finished {
            self.track = None;
        }
        Progress { finished }
    }
}
