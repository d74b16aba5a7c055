//! Playback engine adapter.
//!
//! The device core only talks to audio through [`PlaybackEngine`]. Engines
//! never return errors from playback calls: a file that cannot be decoded
//! simply reads as "finished", and a file that cannot be probed has a
//! duration of zero.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::EngineBackend;
use crate::error::EngineError;

mod duration;
mod output;
mod silent;

#[cfg(test)]
pub(crate) mod fake;

pub use duration::probe_seconds;
pub use output::RodioEngine;
pub use silent::SilentEngine;

/// Result of one progress poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// The most recently opened track has played to its end (or never
    /// started because it could not be decoded).
    pub finished: bool,
}

pub trait PlaybackEngine: Send {
    /// Bring up the output. Calling it on an initialized engine is a no-op.
    fn init(&mut self) -> Result<(), EngineError>;

    /// Tear down the output. Subsequent calls may re-`init`.
    fn release(&mut self);

    /// Replace whatever is loaded with `path` and start playing it.
    fn open(&mut self, path: &Path);

    /// Resume output after [`PlaybackEngine::pause`].
    fn start(&mut self);

    fn pause(&mut self);

    /// Drop the loaded track; progress reads as finished afterwards.
    fn stop(&mut self);

    /// Output volume, 0-100.
    fn set_volume(&mut self, percent: u8);

    /// Playable length of `path` in whole seconds, 0 if unreadable.
    fn query_duration(&self, path: &Path) -> u32;

    fn poll_progress(&mut self) -> Progress;
}

pub type SharedEngine = Arc<Mutex<Box<dyn PlaybackEngine>>>;

/// Build the engine selected in the configuration. Nothing is initialized
/// until the device is opened.
pub fn create(backend: EngineBackend) -> Box<dyn PlaybackEngine> {
    match backend {
        EngineBackend::Rodio => Box::new(RodioEngine::new()),
        EngineBackend::Silent => Box::new(SilentEngine::new()),
    }
}

pub fn shared(engine: Box<dyn PlaybackEngine>) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}
