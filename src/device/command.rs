use crate::mci;

/// Structured request to the virtual drive; parameters follow the protocol
/// parameter blocks and are only read when the matching flag is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(OpenParams),
    Close,
    Set(SetParams),
    Play(PlayParams),
    Stop,
    Pause,
    Resume,
    Status(StatusParams),
    Info,
    Sysinfo(SysinfoItem),
    /// A protocol message the drive does not emulate (seek, capability...).
    Other(u32),
}

impl Command {
    /// Protocol message number.
    pub fn message(&self) -> u32 {
        match self {
            Command::Open(_) => mci::MCI_OPEN,
            Command::Close => mci::MCI_CLOSE,
            Command::Set(_) => mci::MCI_SET,
            Command::Play(_) => mci::MCI_PLAY,
            Command::Stop => mci::MCI_STOP,
            Command::Pause => mci::MCI_PAUSE,
            Command::Resume => mci::MCI_RESUME,
            Command::Status(_) => mci::MCI_STATUS,
            Command::Info => mci::MCI_INFO,
            Command::Sysinfo(_) => mci::MCI_SYSINFO,
            Command::Other(msg) => *msg,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenParams {
    /// New alias for the drive.
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetParams {
    pub time_format: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayParams {
    pub from: u32,
    pub to: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusParams {
    pub item: u32,
    pub track: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysinfoItem {
    Quantity,
    Name,
}

/// Successful result of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Done,
    Number(u32),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyStatus {
    Successful,
    Superseded,
    Aborted,
}

impl NotifyStatus {
    pub fn code(self) -> u32 {
        match self {
            NotifyStatus::Successful => mci::MCI_NOTIFY_SUCCESSFUL,
            NotifyStatus::Superseded => mci::MCI_NOTIFY_SUPERSEDED,
            NotifyStatus::Aborted => mci::MCI_NOTIFY_ABORTED,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NotifyStatus::Successful => "successful",
            NotifyStatus::Superseded => "superseded",
            NotifyStatus::Aborted => "aborted",
        }
    }
}

/// Posted to the client when a notifying command completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub device_id: u32,
    pub status: NotifyStatus,
}
