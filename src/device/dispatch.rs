use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::{RangeMode, Settings};
use crate::engine::SharedEngine;
use crate::error::MciError;
use crate::mci::{self, CommandFlags};
use crate::timefmt::{self, TimeFormat};

use super::command::{
    Command, Notification, NotifyStatus, OpenParams, PlayParams, Reply, SetParams, StatusParams,
    SysinfoItem,
};
use super::sequencer::Sequence;
use super::state::{DeviceState, PlayRange, SequencerView, SharedState};

/// Device options resolved from the settings.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub alias: String,
    pub range_mode: RangeMode,
    pub poll_interval: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for DeviceConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            alias: settings.device.alias.clone(),
            range_mode: settings.playback.range_mode,
            poll_interval: Duration::from_millis(settings.playback.poll_interval_ms.max(1)),
        }
    }
}

/// The single virtual CD drive.
///
/// Safe to call from several control paths at once. The state lock is only
/// held for short reads and writes, never across engine calls; the engine
/// lock may be held while taking the state lock, not the other way round.
pub struct CdDevice {
    state: SharedState,
    engine: SharedEngine,
    catalog: Arc<Catalog>,
    range_mode: RangeMode,
    poll_interval: Duration,
    notify_tx: Sender<Notification>,
    sequencer: Mutex<Option<JoinHandle<()>>>,
}

fn accepts_device(device_id: u32) -> bool {
    device_id == mci::MAGIC_DEVICE_ID || mci::WILDCARD_DEVICE_IDS.contains(&device_id)
}

impl CdDevice {
    pub fn new(
        catalog: Arc<Catalog>,
        engine: SharedEngine,
        config: DeviceConfig,
        notify_tx: Sender<Notification>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(DeviceState::new(config.alias))),
            engine,
            catalog,
            range_mode: config.range_mode,
            poll_interval: config.poll_interval,
            notify_tx,
            sequencer: Mutex::new(None),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn alias(&self) -> String {
        self.state.lock().alias.clone()
    }

    /// Copy of the current device state.
    pub fn snapshot(&self) -> DeviceState {
        self.state.lock().clone()
    }

    /// Execute one structured command addressed to `device_id`.
    pub fn dispatch(
        &self,
        device_id: u32,
        command: Command,
        flags: CommandFlags,
    ) -> Result<Reply, MciError> {
        debug!(
            device_id = format_args!("{device_id:#x}"),
            message = format_args!("{:#06x}", command.message()),
            ?flags,
            "dispatch"
        );

        if !accepts_device(device_id) {
            return Err(MciError::UnrecognizedCommand);
        }

        let arms_notify = matches!(command, Command::Play(_) | Command::Resume);
        let reply = match command {
            Command::Open(params) => self.open(params),
            Command::Close => self.close(),
            Command::Set(params) => self.set(params, flags),
            Command::Play(params) => self.play(params, flags),
            Command::Resume => self.resume(flags),
            Command::Stop => self.stop(),
            Command::Pause => self.pause(),
            Command::Status(params) => self.status(params, flags)?,
            Command::Info => Reply::Text(mci::PRODUCT_NAME.to_string()),
            Command::Sysinfo(SysinfoItem::Quantity) => Reply::Number(1),
            Command::Sysinfo(SysinfoItem::Name) => Reply::Text(self.alias()),
            Command::Other(_) => return Err(MciError::UnrecognizedCommand),
        };

        if flags.contains(CommandFlags::NOTIFY) && !arms_notify {
            self.post(NotifyStatus::Successful);
        }
        Ok(reply)
    }

    /// Wait for the most recent play sequence to end.
    pub fn join_sequencer(&self) {
        let handle = self.sequencer.lock().take();
        if let Some(h) = handle {
            let _ = h.join();
        }
    }

    fn post(&self, status: NotifyStatus) {
        debug!(status = status.name(), "notify");
        let _ = self.notify_tx.send(Notification {
            device_id: mci::MAGIC_DEVICE_ID,
            status,
        });
    }

    fn open(&self, params: OpenParams) -> Reply {
        let newly_opened = {
            let mut state = self.state.lock();
            if let Some(alias) = params.alias {
                state.alias = alias;
            }
            if state.opened {
                false
            } else {
                state.opened = true;
                state.closed = false;
                true
            }
        };

        if newly_opened {
            info!("opening virtual CD drive");
            if let Err(e) = self.engine.lock().init() {
                // The drive still reports as open; plays will finish at once.
                warn!(error = %e, "audio engine unavailable");
            }
        }
        Reply::Done
    }

    fn close(&self) -> Reply {
        let aborted = {
            let mut state = self.state.lock();
            state.opened = false;
            state.closed = true;
            state.playing = false;
            state.paused = false;
            state.range = None;
            state.sequence_active = false;
            std::mem::take(&mut state.notify)
        };
        if aborted {
            self.post(NotifyStatus::Aborted);
        }

        self.join_sequencer();
        let mut engine = self.engine.lock();
        engine.stop();
        engine.release();
        info!("closed virtual CD drive");
        Reply::Done
    }

    fn set(&self, params: SetParams, flags: CommandFlags) -> Reply {
        if flags.contains(CommandFlags::SET_TIME_FORMAT) {
            let format = TimeFormat::from_code(params.time_format);
            debug!(format = format.name(), "set time format");
            self.state.lock().time_format = format;
        }
        Reply::Done
    }

    fn play(&self, params: PlayParams, flags: CommandFlags) -> Reply {
        if self.state.lock().paused {
            return self.resume(flags);
        }

        let (range, generation, superseded) = {
            let mut state = self.state.lock();
            let format = state.time_format;

            let first = if flags.contains(CommandFlags::FROM) {
                timefmt::resolve_track(format, params.from, &self.catalog)
            } else {
                self.catalog.clamp(state.current_track)
            };
            let last = match self.range_mode {
                RangeMode::SingleTrack => first,
                RangeMode::Span if flags.contains(CommandFlags::TO) => {
                    timefmt::resolve_end_track(format, params.to, &self.catalog)
                }
                RangeMode::Span => self.catalog.summary().last_present.unwrap_or(first),
            };
            let range = PlayRange::new(first, last);

            let superseded = state.notify && state.playing && state.sequence_active;
            state.notify = flags.contains(CommandFlags::NOTIFY);
            state.playing = true;
            state.paused = false;
            state.stopped = false;
            state.sequence_active = true;
            state.range = Some(range);
            state.current_track = range.first;
            state.generation += 1;
            (range, state.generation, superseded)
        };

        if superseded {
            self.post(NotifyStatus::Superseded);
        }
        debug!(first = range.first, last = range.last, "play");
        self.spawn_sequence(range, generation, false);
        Reply::Done
    }

    fn resume(&self, flags: CommandFlags) -> Reply {
        let requested = flags.contains(CommandFlags::NOTIFY);
        let continuation = {
            let mut state = self.state.lock();
            if !state.paused {
                drop(state);
                if requested {
                    self.post(NotifyStatus::Successful);
                }
                return Reply::Done;
            }
            state.paused = false;
            match state.range {
                Some(range) => {
                    state.notify |= requested;
                    state.playing = true;
                    state.sequence_active = true;
                    state.generation += 1;
                    Some((
                        PlayRange::new(state.current_track, range.last),
                        state.generation,
                    ))
                }
                None => None,
            }
        };

        self.engine.lock().start();
        match continuation {
            Some((range, generation)) => {
                debug!(track = range.first, last = range.last, "resume");
                self.spawn_sequence(range, generation, true);
            }
            // Nothing left to play, so the request completes here.
            None if requested => self.post(NotifyStatus::Successful),
            None => {}
        }
        Reply::Done
    }

    fn stop(&self) -> Reply {
        let aborted = {
            let mut state = self.state.lock();
            if state.stopped {
                return Reply::Done;
            }
            state.stopped = true;
            state.playing = false;
            state.paused = false;
            state.range = None;
            state.sequence_active = false;
            std::mem::take(&mut state.notify)
        };

        self.engine.lock().stop();
        if aborted {
            self.post(NotifyStatus::Aborted);
        }
        Reply::Done
    }

    fn pause(&self) -> Reply {
        {
            let mut state = self.state.lock();
            if state.paused {
                return Reply::Done;
            }
            state.paused = true;
            state.playing = false;
        }

        self.engine.lock().pause();
        Reply::Done
    }

    fn status(&self, params: StatusParams, flags: CommandFlags) -> Result<Reply, MciError> {
        let state = self.state.lock();
        let format = state.time_format;
        let summary = self.catalog.summary();
        let track = params.track as usize;
        let by_track = flags.contains(CommandFlags::TRACK);

        let value = match params.item {
            mci::MCI_STATUS_NUMBER_OF_TRACKS => summary.total,
            mci::MCI_STATUS_LENGTH if by_track => {
                let secs = self.catalog.get(track).map_or(0, |t| t.length);
                timefmt::encode_length(format, secs)
            }
            mci::MCI_STATUS_LENGTH => timefmt::encode_length(format, self.catalog.disc_length()),
            mci::MCI_STATUS_POSITION if by_track => {
                timefmt::encode_position(format, track, &self.catalog)
            }
            mci::MCI_STATUS_POSITION => {
                timefmt::encode_position(format, state.current_track, &self.catalog)
            }
            mci::MCI_STATUS_MODE => state.mode(),
            mci::MCI_STATUS_MEDIA_PRESENT => 1,
            mci::MCI_STATUS_READY => 1,
            mci::MCI_STATUS_TIME_FORMAT => format.code(),
            mci::MCI_STATUS_CURRENT_TRACK => state.current_track as u32,
            mci::MCI_CDA_STATUS_TYPE_TRACK => {
                if self.catalog.get(track).is_some_and(|t| t.is_present()) {
                    mci::MCI_CDA_TRACK_AUDIO
                } else {
                    mci::MCI_CDA_TRACK_OTHER
                }
            }
            _ => return Err(MciError::UnrecognizedCommand),
        };
        Ok(Reply::Number(value))
    }

    fn spawn_sequence(&self, range: PlayRange, generation: u64, resume: bool) {
        let sequence = Sequence {
            view: SequencerView::new(self.state.clone(), generation),
            engine: self.engine.clone(),
            catalog: self.catalog.clone(),
            range,
            resume,
            poll_interval: self.poll_interval,
            notify_tx: self.notify_tx.clone(),
        };

        let spawned = thread::Builder::new()
            .name(format!("cdemu-play-{generation}"))
            .spawn(move || sequence.run());

        match spawned {
            // The previous sequence exits on its own once it sees the newer
            // generation.
            Ok(handle) => *self.sequencer.lock() = Some(handle),
            Err(e) => warn!(error = %e, "cannot start play sequence"),
        }
    }
}
