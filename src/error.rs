//! Error types shared by the dispatcher, the string parser and the engines.

use thiserror::Error;

use crate::mci;

/// Errors returned across the command boundary.
///
/// Every variant maps onto an MCI error code; callers only ever see the code
/// and the message, never a panic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MciError {
    /// Unknown command, or a command addressed to a foreign device id.
    #[error("unrecognized command")]
    UnrecognizedCommand,

    /// A command string whose keywords matched no rule.
    #[error("unrecognized keyword in {0:?}")]
    UnrecognizedKeyword(String),

    /// A command string addressed to a device name other than the alias.
    #[error("invalid device name {0:?}")]
    InvalidDeviceName(String),
}

impl MciError {
    /// Protocol error code for this error.
    pub fn code(&self) -> u32 {
        match self {
            MciError::UnrecognizedCommand => mci::MCIERR_UNRECOGNIZED_COMMAND,
            MciError::UnrecognizedKeyword(_) => mci::MCIERR_UNRECOGNIZED_KEYWORD,
            MciError::InvalidDeviceName(_) => mci::MCIERR_INVALID_DEVICE_NAME,
        }
    }
}

/// Failures while bringing up an audio engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no audio output device: {0}")]
    NoOutputDevice(String),

    #[error("audio thread failed to start: {0}")]
    Thread(#[from] std::io::Error),
}
