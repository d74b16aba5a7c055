use std::sync::Arc;

use parking_lot::Mutex;

use crate::mci;
use crate::timefmt::TimeFormat;

/// Tracks `first..=last` of one play sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayRange {
    pub first: usize,
    pub last: usize,
}

impl PlayRange {
    /// A `last` before `first` collapses to a single track.
    pub fn new(first: usize, last: usize) -> Self {
        Self {
            first,
            last: last.max(first),
        }
    }
}

/// Lifecycle of the single virtual drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub opened: bool,
    pub closed: bool,
    pub paused: bool,
    pub stopped: bool,
    /// Continuation condition of the running sequence; dispatcher-owned.
    pub playing: bool,
    pub time_format: TimeFormat,
    pub current_track: usize,
    /// A completion notification was requested by the last play.
    pub notify: bool,
    pub range: Option<PlayRange>,
    /// A sequencer is still working through `range`.
    pub sequence_active: bool,
    /// Bumped by every play that starts a sequencer.
    pub generation: u64,
    pub alias: String,
}

impl DeviceState {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            opened: false,
            closed: true,
            paused: false,
            stopped: false,
            playing: false,
            time_format: TimeFormat::default(),
            current_track: 1,
            notify: false,
            range: None,
            sequence_active: false,
            generation: 0,
            alias: alias.into(),
        }
    }

    /// Protocol mode reported by `status ... mode`.
    pub fn mode(&self) -> u32 {
        if self.paused {
            mci::MCI_MODE_PAUSE
        } else if self.playing && self.sequence_active {
            mci::MCI_MODE_PLAY
        } else if self.opened {
            mci::MCI_MODE_STOP
        } else {
            mci::MCI_MODE_NOT_READY
        }
    }
}

pub(crate) type SharedState = Arc<Mutex<DeviceState>>;

/// The sequencer's window onto [`DeviceState`].
///
/// It can read whether its own sequence should continue, but it has no way
/// to change `playing`, `paused`, `stopped` or `closed`. Writes are dropped
/// once a newer play has taken over.
pub(crate) struct SequencerView {
    state: SharedState,
    generation: u64,
}

impl SequencerView {
    pub(crate) fn new(state: SharedState, generation: u64) -> Self {
        Self { state, generation }
    }

    pub(crate) fn still_playing(&self) -> bool {
        let s = self.state.lock();
        s.playing && s.generation == self.generation
    }

    pub(crate) fn set_current_track(&self, track: usize) {
        let mut s = self.state.lock();
        if s.generation == self.generation {
            s.current_track = track;
        }
    }

    /// Close out a sequence that reached the end of its range. Returns
    /// whether a completion notification is due, consuming the request.
    pub(crate) fn complete(&self) -> bool {
        let mut s = self.state.lock();
        if s.generation != self.generation {
            return false;
        }
        s.sequence_active = false;
        s.range = None;
        if s.notify && !s.paused {
            s.notify = false;
            true
        } else {
            false
        }
    }
}
