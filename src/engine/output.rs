//! `rodio`-backed engine.
//!
//! The output stream lives on a dedicated audio thread; the engine handle
//! sends it commands over a channel and reads progress from a shared status
//! handle, so the handle itself stays `Send`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use super::{PlaybackEngine, Progress, probe_seconds};
use crate::error::EngineError;

/// How often the audio thread checks whether the sink drained.
const DRAIN_CHECK: Duration = Duration::from_millis(25);

#[derive(Debug)]
enum EngineCmd {
    Open { path: PathBuf, generation: u64 },
    Start,
    Pause,
    Stop,
    SetVolume(f32),
    Quit,
}

/// Progress bookkeeping shared with the audio thread.
///
/// Every `open` bumps `requested`; the thread publishes the generation whose
/// sink drained in `finished`. A stale drain can never finish a newer track.
#[derive(Debug, Default)]
struct EngineStatus {
    requested: u64,
    finished: u64,
}

type StatusHandle = Arc<Mutex<EngineStatus>>;

pub struct RodioEngine {
    tx: Option<Sender<EngineCmd>>,
    join: Option<JoinHandle<()>>,
    status: StatusHandle,
    volume: f32,
}

impl RodioEngine {
    pub fn new() -> Self {
        Self {
            tx: None,
            join: None,
            status: Arc::new(Mutex::new(EngineStatus::default())),
            volume: 1.0,
        }
    }

    fn send(&mut self, cmd: EngineCmd) {
        if let Some(tx) = &self.tx {
            if tx.send(cmd).is_err() {
                // The audio thread is gone; behave as released.
                self.tx = None;
            }
        }
    }

    fn mark_finished(&self) {
        let mut status = self.status.lock();
        status.finished = status.requested;
    }
}

impl Default for RodioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine for RodioEngine {
    fn init(&mut self) -> Result<(), EngineError> {
        if self.tx.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();
        let status = self.status.clone();
        let volume = self.volume;

        let join = thread::Builder::new()
            .name("cdemu-audio".to_string())
            .spawn(move || audio_thread(rx, ready_tx, status, volume))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                debug!("audio output ready");
                self.tx = Some(tx);
                self.join = Some(join);
                Ok(())
            }
            Ok(Err(msg)) => {
                let _ = join.join();
                Err(EngineError::NoOutputDevice(msg))
            }
            Err(_) => {
                let _ = join.join();
                Err(EngineError::NoOutputDevice(
                    "audio thread exited during startup".to_string(),
                ))
            }
        }
    }

    fn release(&mut self) {
        self.send(EngineCmd::Quit);
        self.tx = None;
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
        self.mark_finished();
    }

    fn open(&mut self, path: &Path) {
        if self.tx.is_none() {
            if let Err(e) = self.init() {
                warn!(error = %e, "cannot open track without audio output");
                self.mark_finished();
                return;
            }
        }

        let generation = {
            let mut status = self.status.lock();
            status.requested += 1;
            status.requested
        };
        self.send(EngineCmd::Open {
            path: path.to_path_buf(),
            generation,
        });
        if self.tx.is_none() {
            self.mark_finished();
        }
    }

    fn start(&mut self) {
        self.send(EngineCmd::Start);
    }

    fn pause(&mut self) {
        self.send(EngineCmd::Pause);
    }

    fn stop(&mut self) {
        self.send(EngineCmd::Stop);
        self.mark_finished();
    }

    fn set_volume(&mut self, percent: u8) {
        self.volume = f32::from(percent.min(100)) / 100.0;
        self.send(EngineCmd::SetVolume(self.volume));
    }

    fn query_duration(&self, path: &Path) -> u32 {
        probe_seconds(path)
    }

    fn poll_progress(&mut self) -> Progress {
        let status = self.status.lock();
        Progress {
            finished: status.finished >= status.requested,
        }
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.release();
    }
}

fn audio_thread(
    rx: Receiver<EngineCmd>,
    ready_tx: Sender<Result<(), String>>,
    status: StatusHandle,
    mut volume: f32,
) {
    let mut stream = match OutputStreamBuilder::open_default_stream() {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };
    // rodio logs to stderr when the stream is dropped, which would land in
    // the middle of command replies.
    stream.log_on_drop(false);
    let _ = ready_tx.send(Ok(()));

    let mut sink: Option<Sink> = None;
    let mut generation: u64 = 0;

    let publish_finished = |generation: u64| {
        let mut s = status.lock();
        if generation > s.finished {
            s.finished = generation;
        }
    };

    loop {
        match rx.recv_timeout(DRAIN_CHECK) {
            Ok(cmd) => match cmd {
                EngineCmd::Open {
                    path,
                    generation: g,
                } => {
                    if let Some(old) = sink.take() {
                        old.stop();
                    }
                    generation = g;
                    match create_sink(&stream, &path) {
                        Ok(new_sink) => {
                            new_sink.set_volume(volume);
                            new_sink.play();
                            sink = Some(new_sink);
                        }
                        Err(msg) => {
                            warn!(path = %path.display(), error = %msg, "cannot play track");
                            publish_finished(g);
                        }
                    }
                }
                EngineCmd::Start => {
                    if let Some(s) = &sink {
                        s.play();
                    }
                }
                EngineCmd::Pause => {
                    if let Some(s) = &sink {
                        s.pause();
                    }
                }
                EngineCmd::Stop => {
                    if let Some(s) = sink.take() {
                        s.stop();
                    }
                    publish_finished(generation);
                }
                EngineCmd::SetVolume(v) => {
                    volume = v;
                    if let Some(s) = &sink {
                        s.set_volume(v);
                    }
                }
                EngineCmd::Quit => {
                    if let Some(s) = sink.take() {
                        s.stop();
                    }
                    break;
                }
            },
            Err(RecvTimeoutError::Timeout) => {
                if sink.as_ref().is_some_and(Sink::empty) {
                    sink = None;
                    publish_finished(generation);
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Open and decode `path` into a playing-ready sink on `stream`.
fn create_sink(stream: &OutputStream, path: &Path) -> Result<Sink, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let source = Decoder::new(BufReader::new(file)).map_err(|e| e.to_string())?;

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    Ok(sink)
}
