//! Scripted engine for tests: fixed durations, recorded calls, and progress
//! that either finishes instantly or waits for the test to release it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{PlaybackEngine, Progress};
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Init,
    Release,
    Open(PathBuf),
    Start,
    Pause,
    Stop,
    SetVolume(u8),
}

#[derive(Debug, Default)]
struct Shared {
    calls: Vec<EngineCall>,
    /// Tracks finish as soon as they are opened.
    auto_finish: bool,
    /// Current track done (only consulted when `auto_finish` is off).
    finished: bool,
}

/// Test-side view of a [`FakeEngine`].
#[derive(Debug, Clone, Default)]
pub struct FakeHandle {
    shared: Arc<Mutex<Shared>>,
}

impl FakeHandle {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.shared.lock().calls.clone()
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Open(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.shared.lock().calls.iter().filter(|c| *c == call).count()
    }

    /// Let the currently loaded track end.
    pub fn finish_current(&self) {
        self.shared.lock().finished = true;
    }
}

pub struct FakeEngine {
    durations: HashMap<PathBuf, u32>,
    handle: FakeHandle,
}

impl FakeEngine {
    /// Engine whose tracks end on the first poll.
    pub fn instant() -> (Self, FakeHandle) {
        Self::build(true)
    }

    /// Engine whose tracks play until [`FakeHandle::finish_current`].
    pub fn holding() -> (Self, FakeHandle) {
        Self::build(false)
    }

    fn build(auto_finish: bool) -> (Self, FakeHandle) {
        let handle = FakeHandle::default();
        handle.shared.lock().auto_finish = auto_finish;
        let engine = Self {
            durations: HashMap::new(),
            handle: handle.clone(),
        };
        (engine, handle)
    }

    pub fn with_duration(mut self, path: impl Into<PathBuf>, secs: u32) -> Self {
        self.durations.insert(path.into(), secs);
        self
    }

    fn record(&self, call: EngineCall) {
        self.handle.shared.lock().calls.push(call);
    }
}

impl PlaybackEngine for FakeEngine {
    fn init(&mut self) -> Result<(), EngineError> {
        self.record(EngineCall::Init);
        Ok(())
    }

    fn release(&mut self) {
        self.record(EngineCall::Release);
    }

    fn open(&mut self, path: &Path) {
        let mut shared = self.handle.shared.lock();
        shared.calls.push(EngineCall::Open(path.to_path_buf()));
        shared.finished = false;
    }

    fn start(&mut self) {
        self.record(EngineCall::Start);
    }

    fn pause(&mut self) {
        self.record(EngineCall::Pause);
    }

    fn stop(&mut self) {
        let mut shared = self.handle.shared.lock();
        shared.calls.push(EngineCall::Stop);
        shared.finished = true;
    }

    fn set_volume(&mut self, percent: u8) {
        self.record(EngineCall::SetVolume(percent));
    }

    fn query_duration(&self, path: &Path) -> u32 {
        self.durations.get(path).copied().unwrap_or(0)
    }

    fn poll_progress(&mut self) -> Progress {
        let shared = self.handle.shared.lock();
        Progress {
            finished: shared.auto_finish || shared.finished,
        }
    }
}
