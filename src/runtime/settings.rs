use std::path::PathBuf;

use crate::config;

/// Load settings, falling back to defaults. Tracing is not up yet, so a
/// problem is handed back as a message for the caller to log.
pub fn load_settings(path: Option<PathBuf>) -> (config::Settings, Option<String>) {
    let loaded = match path {
        Some(p) => config::Settings::load_from(Some(p)),
        None => config::Settings::load(),
    };
    match loaded {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                (
                    config::Settings::default(),
                    Some(format!("invalid config, using defaults: {msg}")),
                )
            } else {
                (s, None)
            }
        }
        // Config is optional; failures should not keep the drive from starting.
        Err(e) => (
            config::Settings::default(),
            Some(format!("failed to load config, using defaults: {e}")),
        ),
    }
}

