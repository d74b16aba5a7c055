//! The virtual CD drive: structured command dispatch, lifecycle state and
//! the background play sequencer.

mod command;
mod dispatch;
mod sequencer;
mod state;

pub use command::*;
pub use dispatch::{CdDevice, DeviceConfig};
pub use state::{DeviceState, PlayRange};

#[cfg(test)]
mod tests;
