use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::sync::{self, mpsc};

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::catalog::Catalog;
use crate::config::{self, LogSettings};
use crate::device::{CdDevice, DeviceConfig, Notification};
use crate::engine::{self, SharedEngine};
use crate::volume::AuxDevice;

/// Install the global subscriber. `RUST_LOG` wins over `log.filter`.
pub fn init_tracing(log: &LogSettings) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);

    match &log.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(
                    fmt::layer()
                        .with_writer(sync::Mutex::new(file))
                        .with_ansi(false),
                )
                .try_init()?;
        }
        // stdout carries replies.
        None => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}

/// Everything the control surface needs.
pub struct Drive {
    pub device: Arc<CdDevice>,
    pub aux: AuxDevice,
    pub notifications: Receiver<Notification>,
}

/// Build the engine and catalog for `music_dir` and wire up the drive.
pub fn assemble(settings: &config::Settings, music_dir: &Path) -> Drive {
    let engine: SharedEngine = engine::shared(engine::create(settings.engine.backend));
    info!(backend = ?settings.engine.backend, "playback engine");

    let catalog = Catalog::build(music_dir, &settings.catalog, &**engine.lock());
    if catalog.is_empty() {
        warn!(dir = %music_dir.display(), "no playable tracks; the disc is empty");
    }

    let (notify_tx, notifications) = mpsc::channel();
    let device = CdDevice::new(
        Arc::new(catalog),
        engine.clone(),
        DeviceConfig::from(settings),
        notify_tx,
    );

    let aux = AuxDevice::new(engine);
    aux.set_percent(settings.audio.music_volume);

    Drive {
        device: Arc::new(device),
        aux,
        notifications,
    }
}
