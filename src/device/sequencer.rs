use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::engine::SharedEngine;
use crate::mci;

use super::command::{Notification, NotifyStatus};
use super::state::{PlayRange, SequencerView};

/// One play sequence, run on its own thread.
pub(crate) struct Sequence {
    pub view: SequencerView,
    pub engine: SharedEngine,
    pub catalog: Arc<Catalog>,
    pub range: PlayRange,
    /// The first track is already loaded in the engine (resume after pause).
    pub resume: bool,
    pub poll_interval: Duration,
    pub notify_tx: Sender<Notification>,
}

impl Sequence {
    pub(crate) fn run(self) {
        let first_present = self.catalog.summary().first_present.unwrap_or(0);
        let mut current = self.range.first.max(first_present);
        let mut loaded = self.resume;

        debug!(first = current, last = self.range.last, resume = self.resume, "play sequence");

        while current <= self.range.last && self.view.still_playing() {
            if !loaded {
                let mut engine = self.engine.lock();
                // Checked under the engine lock so a stop that already ran
                // cannot be followed by a fresh open.
                if !self.view.still_playing() {
                    return;
                }
                let Some(path) = self.catalog.get(current).and_then(|t| t.path()) else {
                    trace!(track = current, "no file for slot, skipping");
                    current += 1;
                    continue;
                };
                debug!(track = current, path = %path.display(), "next track");
                engine.open(path);
                self.view.set_current_track(current);
            }
            loaded = false;

            if !self.wait_for_track_end() {
                return;
            }
            current += 1;
        }

        if !self.view.still_playing() {
            return;
        }

        if self.view.complete() {
            debug!("sending notify successful");
            let _ = self.notify_tx.send(Notification {
                device_id: mci::MAGIC_DEVICE_ID,
                status: NotifyStatus::Successful,
            });
        }
    }

    /// Poll until the loaded track ends. `false` when the sequence was
    /// cancelled meanwhile.
    fn wait_for_track_end(&self) -> bool {
        loop {
            if self.engine.lock().poll_progress().finished {
                return true;
            }
            if !self.view.still_playing() {
                return false;
            }
            thread::sleep(self.poll_interval);
        }
    }
}
