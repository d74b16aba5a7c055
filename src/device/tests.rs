use super::*;
use crate::catalog::{Catalog, CatalogBuilder};
use crate::config::RangeMode;
use crate::engine::fake::{EngineCall, FakeEngine, FakeHandle};
use crate::engine::{self, PlaybackEngine};
use crate::error::MciError;
use crate::mci::{self, CommandFlags};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

const ID: u32 = mci::MAGIC_DEVICE_ID;

// 01 missing, 02 = 3:00 @ 4, 03 = 3:20 @ 184, 04 missing, 05 = 2:30 @ 388
fn disc() -> Arc<Catalog> {
    let mut builder = CatalogBuilder::new();
    for (i, len) in [0, 180, 200, 0, 150].into_iter().enumerate() {
        builder.push(track_path(i + 1), len);
    }
    Arc::new(builder.finish())
}

fn track_path(n: usize) -> PathBuf {
    PathBuf::from(format!("/music/{n:02}.ogg"))
}

struct Rig {
    device: CdDevice,
    engine: FakeHandle,
    notes: Receiver<Notification>,
}

fn rig_with(fake: (FakeEngine, FakeHandle), range_mode: RangeMode) -> Rig {
    let (engine, handle) = fake;
    let boxed: Box<dyn PlaybackEngine> = Box::new(engine);
    let (tx, notes) = mpsc::channel();
    let config = DeviceConfig {
        alias: "cdaudio".to_string(),
        range_mode,
        poll_interval: Duration::from_millis(1),
    };
    let device = CdDevice::new(disc(), engine::shared(boxed), config, tx);
    Rig {
        device,
        engine: handle,
        notes,
    }
}

fn instant() -> Rig {
    rig_with(FakeEngine::instant(), RangeMode::SingleTrack)
}

fn holding() -> Rig {
    rig_with(FakeEngine::holding(), RangeMode::SingleTrack)
}

fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(1));
    }
}

impl Rig {
    fn send(&self, command: Command, flags: CommandFlags) -> Result<Reply, MciError> {
        self.device.dispatch(ID, command, flags)
    }

    fn play_from(&self, from: u32, flags: CommandFlags) {
        let params = PlayParams { from, to: 0 };
        self.send(Command::Play(params), flags | CommandFlags::FROM)
            .unwrap();
    }

    fn status(&self, item: u32, track: Option<u32>) -> u32 {
        let flags = match track {
            Some(_) => CommandFlags::STATUS_ITEM | CommandFlags::TRACK,
            None => CommandFlags::STATUS_ITEM,
        };
        let params = StatusParams {
            item,
            track: track.unwrap_or(0),
        };
        match self.send(Command::Status(params), flags).unwrap() {
            Reply::Number(n) => n,
            other => panic!("unexpected reply {other:?}"),
        }
    }

    fn set_format(&self, code: u32) {
        self.send(
            Command::Set(SetParams { time_format: code }),
            CommandFlags::SET_TIME_FORMAT,
        )
        .unwrap();
    }

    fn wait_opened(&self, n: usize) {
        wait_until("engine open", || self.engine.opened().len() == n);
    }

    fn no_more_notes(&self) {
        assert_eq!(self.notes.try_recv(), Err(TryRecvError::Empty));
    }
}

#[test]
fn foreign_device_ids_are_unrecognized() {
    let rig = instant();
    let before = rig.device.snapshot();
    let err = rig
        .device
        .dispatch(0x1234, Command::Open(OpenParams::default()), CommandFlags::empty())
        .unwrap_err();
    assert_eq!(err, MciError::UnrecognizedCommand);
    assert_eq!(err.code(), 261);
    assert_eq!(rig.device.snapshot(), before);
    assert!(rig.engine.calls().is_empty());
}

#[test]
fn wildcard_device_ids_are_accepted() {
    let rig = instant();
    for id in [0, 0xFFFF_FFFF] {
        assert_eq!(
            rig.device.dispatch(id, Command::Info, CommandFlags::empty()),
            Ok(Reply::Text(mci::PRODUCT_NAME.to_string()))
        );
    }
}

#[test]
fn unemulated_messages_are_unrecognized() {
    let rig = instant();
    assert_eq!(
        rig.send(Command::Other(mci::MCI_SEEK), CommandFlags::empty()),
        Err(MciError::UnrecognizedCommand)
    );
    assert_eq!(
        rig.send(Command::Other(mci::MCI_GETDEVCAPS), CommandFlags::empty()),
        Err(MciError::UnrecognizedCommand)
    );
}

#[test]
fn open_is_idempotent() {
    let rig = instant();
    rig.send(Command::Open(OpenParams::default()), CommandFlags::empty())
        .unwrap();
    let once = rig.device.snapshot();
    rig.send(Command::Open(OpenParams::default()), CommandFlags::empty())
        .unwrap();

    assert_eq!(rig.device.snapshot(), once);
    assert!(once.opened);
    assert!(!once.closed);
    assert_eq!(rig.engine.count(&EngineCall::Init), 1);
}

#[test]
fn open_with_alias_renames_the_drive() {
    let rig = instant();
    let params = OpenParams {
        alias: Some("music".to_string()),
    };
    rig.send(Command::Open(params), CommandFlags::empty()).unwrap();
    assert_eq!(rig.device.alias(), "music");
    assert_eq!(
        rig.send(Command::Sysinfo(SysinfoItem::Name), CommandFlags::empty()),
        Ok(Reply::Text("music".to_string()))
    );
}

#[test]
fn close_releases_the_engine() {
    let rig = instant();
    rig.send(Command::Open(OpenParams::default()), CommandFlags::empty())
        .unwrap();
    rig.send(Command::Close, CommandFlags::empty()).unwrap();

    let state = rig.device.snapshot();
    assert!(!state.opened);
    assert!(state.closed);
    assert!(!state.playing);
    assert_eq!(rig.engine.count(&EngineCall::Release), 1);
}

#[test]
fn close_cancels_a_running_sequence() {
    let rig = holding();
    rig.play_from(3, CommandFlags::NOTIFY);
    rig.wait_opened(1);

    rig.send(Command::Close, CommandFlags::empty()).unwrap();
    rig.device.join_sequencer();

    assert_eq!(
        rig.notes.try_recv().map(|n| n.status),
        Ok(NotifyStatus::Aborted)
    );
    rig.no_more_notes();
}

#[test]
fn set_stores_the_time_format() {
    let rig = instant();
    rig.set_format(mci::MCI_FORMAT_MILLISECONDS);
    assert_eq!(
        rig.device.snapshot().time_format,
        crate::timefmt::TimeFormat::Milliseconds
    );

    // Without the time-format flag nothing changes.
    rig.send(
        Command::Set(SetParams {
            time_format: mci::MCI_FORMAT_TMSF,
        }),
        CommandFlags::empty(),
    )
    .unwrap();
    assert_eq!(
        rig.device.snapshot().time_format,
        crate::timefmt::TimeFormat::Milliseconds
    );
}

#[test]
fn play_from_tmsf_plays_one_track_and_completes() {
    let rig = instant();
    rig.send(Command::Open(OpenParams::default()), CommandFlags::empty())
        .unwrap();
    rig.play_from(mci::make_tmsf(3, 0, 0, 0), CommandFlags::empty());
    rig.device.join_sequencer();

    assert_eq!(rig.engine.opened(), vec![track_path(3)]);
    let state = rig.device.snapshot();
    assert_eq!(state.current_track, 3);
    assert_eq!(state.range, None);
    assert_eq!(state.mode(), mci::MCI_MODE_STOP);
    // No notification was requested.
    rig.no_more_notes();
}

#[test]
fn play_with_notify_posts_success_exactly_once() {
    let rig = instant();
    rig.play_from(2, CommandFlags::NOTIFY);
    rig.device.join_sequencer();

    let note = rig.notes.try_recv().unwrap();
    assert_eq!(note.status, NotifyStatus::Successful);
    assert_eq!(note.device_id, mci::MAGIC_DEVICE_ID);
    rig.no_more_notes();
    assert!(!rig.device.snapshot().notify);
}

#[test]
fn from_to_collapses_to_a_single_track() {
    let rig = instant();
    let params = PlayParams { from: 2, to: 3 };
    rig.send(Command::Play(params), CommandFlags::FROM | CommandFlags::TO)
        .unwrap();
    rig.device.join_sequencer();

    assert_eq!(rig.engine.opened(), vec![track_path(2)]);
}

#[test]
fn span_mode_plays_up_to_the_track_before_to() {
    let rig = rig_with(FakeEngine::instant(), RangeMode::Span);
    let params = PlayParams { from: 2, to: 5 };
    rig.send(Command::Play(params), CommandFlags::FROM | CommandFlags::TO)
        .unwrap();
    rig.device.join_sequencer();

    // Slot 4 has no file and is skipped.
    assert_eq!(rig.engine.opened(), vec![track_path(2), track_path(3)]);
}

#[test]
fn span_mode_without_to_plays_to_the_last_track() {
    let rig = rig_with(FakeEngine::instant(), RangeMode::Span);
    rig.play_from(3, CommandFlags::empty());
    rig.device.join_sequencer();

    assert_eq!(rig.engine.opened(), vec![track_path(3), track_path(5)]);
}

#[test]
fn span_mode_to_before_from_collapses() {
    let rig = rig_with(FakeEngine::instant(), RangeMode::Span);
    let params = PlayParams { from: 3, to: 3 };
    rig.send(Command::Play(params), CommandFlags::FROM | CommandFlags::TO)
        .unwrap();
    rig.device.join_sequencer();

    assert_eq!(rig.engine.opened(), vec![track_path(3)]);
}

#[test]
fn span_mode_to_past_the_last_track_reaches_it() {
    let rig = rig_with(FakeEngine::instant(), RangeMode::Span);
    let params = PlayParams { from: 2, to: 6 };
    rig.send(Command::Play(params), CommandFlags::FROM | CommandFlags::TO)
        .unwrap();
    rig.device.join_sequencer();

    assert_eq!(
        rig.engine.opened(),
        vec![track_path(2), track_path(3), track_path(5)]
    );
}

#[test]
fn span_mode_to_inside_the_last_track_keeps_it() {
    let rig = rig_with(FakeEngine::instant(), RangeMode::Span);
    let params = PlayParams {
        from: mci::make_tmsf(2, 0, 0, 0),
        to: mci::make_tmsf(5, 2, 30, 0),
    };
    rig.send(Command::Play(params), CommandFlags::FROM | CommandFlags::TO)
        .unwrap();
    rig.device.join_sequencer();

    assert_eq!(
        rig.engine.opened(),
        vec![track_path(2), track_path(3), track_path(5)]
    );
}

#[test]
fn span_mode_to_at_the_disc_end_in_milliseconds_keeps_the_last_track() {
    let rig = rig_with(FakeEngine::instant(), RangeMode::Span);
    rig.set_format(mci::MCI_FORMAT_MILLISECONDS);
    let params = PlayParams {
        from: 4_000,
        to: 538_000,
    };
    rig.send(Command::Play(params), CommandFlags::FROM | CommandFlags::TO)
        .unwrap();
    rig.device.join_sequencer();

    assert_eq!(
        rig.engine.opened(),
        vec![track_path(2), track_path(3), track_path(5)]
    );
}

#[test]
fn play_from_milliseconds_maps_exact_offsets() {
    let rig = instant();
    rig.set_format(mci::MCI_FORMAT_MILLISECONDS);

    rig.play_from(184_000, CommandFlags::empty());
    rig.device.join_sequencer();
    // No exact match: track 0, clamped to the first audio track.
    rig.play_from(5_000, CommandFlags::empty());
    rig.device.join_sequencer();

    assert_eq!(rig.engine.opened(), vec![track_path(3), track_path(2)]);
}

#[test]
fn out_of_range_tracks_are_clamped() {
    let rig = instant();
    rig.play_from(42, CommandFlags::empty());
    rig.device.join_sequencer();
    rig.play_from(1, CommandFlags::empty());
    rig.device.join_sequencer();

    assert_eq!(rig.engine.opened(), vec![track_path(5), track_path(2)]);
}

#[test]
fn play_without_from_uses_the_current_track() {
    let rig = instant();
    rig.play_from(3, CommandFlags::empty());
    rig.device.join_sequencer();
    rig.send(Command::Play(PlayParams::default()), CommandFlags::empty())
        .unwrap();
    rig.device.join_sequencer();

    assert_eq!(rig.engine.opened(), vec![track_path(3), track_path(3)]);
}

#[test]
fn stop_cancels_and_aborts_pending_notification() {
    let rig = holding();
    rig.play_from(3, CommandFlags::NOTIFY);
    rig.wait_opened(1);
    assert_eq!(rig.device.snapshot().mode(), mci::MCI_MODE_PLAY);

    rig.send(Command::Stop, CommandFlags::empty()).unwrap();
    rig.device.join_sequencer();

    let state = rig.device.snapshot();
    assert!(state.stopped);
    assert!(!state.playing);
    assert_eq!(state.range, None);
    assert_eq!(state.mode(), mci::MCI_MODE_STOP);
    assert_eq!(
        rig.notes.try_recv().map(|n| n.status),
        Ok(NotifyStatus::Aborted)
    );
    rig.no_more_notes();
}

#[test]
fn stop_is_idempotent() {
    let rig = instant();
    rig.send(Command::Stop, CommandFlags::empty()).unwrap();
    let once = rig.device.snapshot();
    rig.send(Command::Stop, CommandFlags::empty()).unwrap();

    assert_eq!(rig.device.snapshot(), once);
    assert_eq!(rig.engine.count(&EngineCall::Stop), 1);
}

#[test]
fn play_after_stop_starts_fresh() {
    let rig = holding();
    rig.play_from(3, CommandFlags::empty());
    rig.wait_opened(1);
    rig.send(Command::Stop, CommandFlags::empty()).unwrap();

    rig.play_from(2, CommandFlags::empty());
    rig.wait_opened(2);

    let state = rig.device.snapshot();
    assert_eq!(rig.engine.opened(), vec![track_path(3), track_path(2)]);
    assert_eq!(state.range, Some(PlayRange { first: 2, last: 2 }));
    assert_eq!(state.current_track, 2);
    assert!(!state.stopped);
    assert!(state.playing);

    rig.send(Command::Stop, CommandFlags::empty()).unwrap();
    rig.device.join_sequencer();
}

#[test]
fn pause_then_play_resumes_without_decoding_from() {
    let rig = holding();
    rig.play_from(3, CommandFlags::NOTIFY);
    rig.wait_opened(1);

    rig.send(Command::Pause, CommandFlags::empty()).unwrap();
    rig.device.join_sequencer();
    let paused = rig.device.snapshot();
    assert!(paused.paused);
    assert!(!paused.playing);
    assert_eq!(paused.mode(), mci::MCI_MODE_PAUSE);

    // A different FROM is ignored while paused.
    rig.play_from(2, CommandFlags::empty());
    let resumed = rig.device.snapshot();
    assert!(!resumed.paused);
    assert!(resumed.playing);
    assert_eq!(resumed.current_track, 3);
    assert_eq!(rig.engine.count(&EngineCall::Start), 1);

    // The resumed sequence keeps polling the loaded track.
    rig.engine.finish_current();
    rig.device.join_sequencer();
    assert_eq!(rig.engine.opened(), vec![track_path(3)]);
    assert_eq!(
        rig.notes.try_recv().map(|n| n.status),
        Ok(NotifyStatus::Successful)
    );
    rig.no_more_notes();
}

#[test]
fn pause_is_idempotent() {
    let rig = holding();
    rig.play_from(2, CommandFlags::empty());
    rig.wait_opened(1);
    rig.send(Command::Pause, CommandFlags::empty()).unwrap();
    rig.send(Command::Pause, CommandFlags::empty()).unwrap();

    assert_eq!(rig.engine.count(&EngineCall::Pause), 1);
    rig.send(Command::Stop, CommandFlags::empty()).unwrap();
    rig.device.join_sequencer();
}

#[test]
fn resume_command_only_acts_when_paused() {
    let rig = instant();
    rig.send(Command::Resume, CommandFlags::empty()).unwrap();
    assert_eq!(rig.engine.count(&EngineCall::Start), 0);

    rig.send(Command::Pause, CommandFlags::empty()).unwrap();
    rig.send(Command::Resume, CommandFlags::empty()).unwrap();
    assert_eq!(rig.engine.count(&EngineCall::Start), 1);
    assert!(!rig.device.snapshot().paused);
}

#[test]
fn resume_with_nothing_to_play_completes_its_notification() {
    let rig = instant();
    rig.send(Command::Pause, CommandFlags::empty()).unwrap();
    rig.play_from(2, CommandFlags::NOTIFY);

    assert_eq!(
        rig.notes.try_recv().map(|n| n.status),
        Ok(NotifyStatus::Successful)
    );
    assert!(!rig.device.snapshot().notify);

    // Nothing is left pending for STOP to abort.
    rig.send(Command::Stop, CommandFlags::empty()).unwrap();
    rig.no_more_notes();
}

#[test]
fn resume_while_not_paused_completes_its_notification() {
    let rig = instant();
    rig.send(Command::Resume, CommandFlags::NOTIFY).unwrap();

    assert_eq!(
        rig.notes.try_recv().map(|n| n.status),
        Ok(NotifyStatus::Successful)
    );
    rig.no_more_notes();
    assert_eq!(rig.engine.count(&EngineCall::Start), 0);
}

#[test]
fn stop_while_paused_clears_pause() {
    let rig = holding();
    rig.play_from(3, CommandFlags::empty());
    rig.wait_opened(1);
    rig.send(Command::Pause, CommandFlags::empty()).unwrap();
    rig.send(Command::Stop, CommandFlags::empty()).unwrap();
    rig.device.join_sequencer();

    // The next play decodes its FROM instead of resuming.
    rig.play_from(2, CommandFlags::empty());
    rig.wait_opened(2);
    assert_eq!(rig.engine.opened(), vec![track_path(3), track_path(2)]);
    rig.send(Command::Stop, CommandFlags::empty()).unwrap();
    rig.device.join_sequencer();
}

#[test]
fn new_play_supersedes_pending_notification() {
    let rig = holding();
    rig.play_from(2, CommandFlags::NOTIFY);
    rig.wait_opened(1);
    rig.play_from(3, CommandFlags::empty());
    rig.wait_opened(2);

    assert_eq!(
        rig.notes.try_recv().map(|n| n.status),
        Ok(NotifyStatus::Superseded)
    );
    rig.send(Command::Stop, CommandFlags::empty()).unwrap();
    rig.device.join_sequencer();
    rig.no_more_notes();
}

#[test]
fn notify_flag_on_other_commands_posts_immediately() {
    let rig = instant();
    rig.send(Command::Open(OpenParams::default()), CommandFlags::NOTIFY | CommandFlags::WAIT)
        .unwrap();
    assert_eq!(
        rig.notes.try_recv().map(|n| n.status),
        Ok(NotifyStatus::Successful)
    );
    rig.no_more_notes();
}

#[test]
fn status_reports_catalog_and_lifecycle() {
    let rig = instant();

    assert_eq!(rig.status(mci::MCI_STATUS_NUMBER_OF_TRACKS, None), 4);
    assert_eq!(rig.status(mci::MCI_STATUS_MODE, None), mci::MCI_MODE_NOT_READY);
    assert_eq!(rig.status(mci::MCI_STATUS_MEDIA_PRESENT, None), 1);
    assert_eq!(rig.status(mci::MCI_STATUS_CURRENT_TRACK, None), 1);
    assert_eq!(rig.status(mci::MCI_STATUS_TIME_FORMAT, None), mci::MCI_FORMAT_TMSF);
    assert_eq!(
        rig.status(mci::MCI_CDA_STATUS_TYPE_TRACK, Some(1)),
        mci::MCI_CDA_TRACK_OTHER
    );
    assert_eq!(
        rig.status(mci::MCI_CDA_STATUS_TYPE_TRACK, Some(3)),
        mci::MCI_CDA_TRACK_AUDIO
    );
    assert_eq!(
        rig.status(mci::MCI_STATUS_LENGTH, Some(3)),
        mci::make_msf(3, 20, 0)
    );
    assert_eq!(rig.status(mci::MCI_STATUS_POSITION, Some(3)), mci::make_tmsf(3, 0, 0, 0));

    rig.set_format(mci::MCI_FORMAT_MILLISECONDS);
    assert_eq!(rig.status(mci::MCI_STATUS_LENGTH, Some(3)), 200_000);
    assert_eq!(rig.status(mci::MCI_STATUS_LENGTH, None), 538_000);
    assert_eq!(rig.status(mci::MCI_STATUS_POSITION, Some(3)), 184_000);

    rig.send(Command::Open(OpenParams::default()), CommandFlags::empty())
        .unwrap();
    assert_eq!(rig.status(mci::MCI_STATUS_MODE, None), mci::MCI_MODE_STOP);
}

#[test]
fn status_is_read_only() {
    let rig = instant();
    let before = rig.device.snapshot();
    rig.status(mci::MCI_STATUS_POSITION, None);
    rig.status(mci::MCI_STATUS_LENGTH, Some(99));
    assert_eq!(rig.device.snapshot(), before);
    assert!(rig.engine.calls().is_empty());
}

#[test]
fn unknown_status_item_is_unrecognized() {
    let rig = instant();
    let params = StatusParams {
        item: 0x7777,
        track: 0,
    };
    assert_eq!(
        rig.send(Command::Status(params), CommandFlags::STATUS_ITEM),
        Err(MciError::UnrecognizedCommand)
    );
}

#[test]
fn sysinfo_reports_one_drive() {
    let rig = instant();
    assert_eq!(
        rig.send(Command::Sysinfo(SysinfoItem::Quantity), CommandFlags::empty()),
        Ok(Reply::Number(1))
    );
    assert_eq!(
        rig.send(Command::Sysinfo(SysinfoItem::Name), CommandFlags::empty()),
        Ok(Reply::Text("cdaudio".to_string()))
    );
}
