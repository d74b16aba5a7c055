//! Textual command surface (`play cdaudio from 2 to 3 notify`).
//!
//! A command string is split into words; `notify` and `wait` are lifted out
//! as flags wherever they appear. The verb selects a rule from [`VERBS`],
//! the device word is checked against the drive alias, and the remaining
//! words are matched by the verb's own rule. Status items go through the
//! ordered [`STATUS_ITEMS`] table, most specific first.

use std::sync::Arc;

use tracing::debug;

use crate::device::{
    CdDevice, Command, OpenParams, PlayParams, Reply, SetParams, StatusParams, SysinfoItem,
};
use crate::error::MciError;
use crate::mci::{self, CommandFlags};
use crate::timefmt::TimeFormat;

/// Device type name accepted by `open` and `sysinfo` besides the alias.
pub const DEVICE_TYPE: &str = "cdaudio";

/// How the numeric result of a command is rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    Empty,
    Decimal,
    Mode,
    TrackType,
    Bool,
    TimeFormat,
    Text,
}

impl ReplyFormat {
    pub fn render(self, reply: Reply) -> String {
        let n = match reply {
            Reply::Done => return String::new(),
            Reply::Text(text) => return text,
            Reply::Number(n) => n,
        };
        match self {
            ReplyFormat::Empty => String::new(),
            ReplyFormat::Decimal | ReplyFormat::Text => n.to_string(),
            ReplyFormat::Mode => mode_name(n).map_or_else(|| n.to_string(), str::to_string),
            ReplyFormat::TrackType if n == mci::MCI_CDA_TRACK_AUDIO => "audio".to_string(),
            ReplyFormat::TrackType => "other".to_string(),
            ReplyFormat::Bool if n != 0 => "TRUE".to_string(),
            ReplyFormat::Bool => "FALSE".to_string(),
            ReplyFormat::TimeFormat => TimeFormat::from_code(n).name().to_string(),
        }
    }
}

fn mode_name(mode: u32) -> Option<&'static str> {
    match mode {
        mci::MCI_MODE_NOT_READY => Some("not ready"),
        mci::MCI_MODE_STOP => Some("stopped"),
        mci::MCI_MODE_PLAY => Some("playing"),
        mci::MCI_MODE_PAUSE => Some("paused"),
        mci::MCI_MODE_OPEN => Some("open"),
        _ => None,
    }
}

/// A command string translated into one structured dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: Command,
    pub flags: CommandFlags,
    pub format: ReplyFormat,
}

impl ParsedCommand {
    fn new(command: Command) -> Self {
        Self {
            command,
            flags: CommandFlags::empty(),
            format: ReplyFormat::Empty,
        }
    }

    fn with_flags(mut self, flags: CommandFlags) -> Self {
        self.flags |= flags;
        self
    }

    fn replying(mut self, format: ReplyFormat) -> Self {
        self.format = format;
        self
    }
}

/// Words of one command string, flags already lifted out.
struct Words<'a> {
    verb: String,
    device: Option<&'a str>,
    args: Vec<&'a str>,
    flags: CommandFlags,
}

impl<'a> Words<'a> {
    fn split(text: &'a str) -> Option<Self> {
        let mut flags = CommandFlags::empty();
        let mut words = Vec::new();
        for word in text.split_whitespace() {
            if word.eq_ignore_ascii_case("notify") {
                flags |= CommandFlags::NOTIFY;
            } else if word.eq_ignore_ascii_case("wait") {
                flags |= CommandFlags::WAIT;
            } else {
                words.push(word);
            }
        }

        let mut words = words.into_iter();
        let verb = words.next()?.to_ascii_lowercase();
        Some(Self {
            verb,
            device: words.next(),
            args: words.collect(),
            flags,
        })
    }

    /// The arguments are exactly `keywords`, ignoring case.
    fn args_are(&self, keywords: &[&str]) -> bool {
        self.args.len() == keywords.len() && starts_with(&self.args, keywords)
    }
}

fn starts_with(args: &[&str], keywords: &[&str]) -> bool {
    args.len() >= keywords.len()
        && args
            .iter()
            .zip(keywords)
            .all(|(a, k)| a.eq_ignore_ascii_case(k))
}

/// Which device words a verb accepts.
#[derive(Debug, Clone, Copy)]
enum DeviceWord {
    /// The alias, compared case-sensitively.
    Alias,
    /// The alias, or the device type in any case.
    AliasOrType,
}

type BuildFn = fn(&Words<'_>) -> Option<ParsedCommand>;

struct VerbRule {
    verb: &'static str,
    device: DeviceWord,
    build: BuildFn,
}

/// Verb rules, looked up by exact verb (case-insensitive).
const VERBS: &[VerbRule] = &[
    VerbRule { verb: "sysinfo", device: DeviceWord::AliasOrType, build: build_sysinfo },
    VerbRule { verb: "info", device: DeviceWord::Alias, build: build_info },
    VerbRule { verb: "open", device: DeviceWord::AliasOrType, build: build_open },
    VerbRule { verb: "close", device: DeviceWord::Alias, build: build_close },
    VerbRule { verb: "stop", device: DeviceWord::Alias, build: build_stop },
    VerbRule { verb: "pause", device: DeviceWord::Alias, build: build_pause },
    VerbRule { verb: "resume", device: DeviceWord::Alias, build: build_resume },
    VerbRule { verb: "status", device: DeviceWord::Alias, build: build_status },
    VerbRule { verb: "set", device: DeviceWord::Alias, build: build_set },
    VerbRule { verb: "play", device: DeviceWord::Alias, build: build_play },
    VerbRule { verb: "seek", device: DeviceWord::Alias, build: build_seek },
    VerbRule { verb: "capability", device: DeviceWord::Alias, build: build_capability },
];

fn bare(words: &Words<'_>, command: Command) -> Option<ParsedCommand> {
    words.args.is_empty().then(|| ParsedCommand::new(command))
}

fn build_close(words: &Words<'_>) -> Option<ParsedCommand> {
    bare(words, Command::Close)
}

fn build_stop(words: &Words<'_>) -> Option<ParsedCommand> {
    bare(words, Command::Stop)
}

fn build_pause(words: &Words<'_>) -> Option<ParsedCommand> {
    bare(words, Command::Pause)
}

fn build_resume(words: &Words<'_>) -> Option<ParsedCommand> {
    bare(words, Command::Resume)
}

// Recognized verbs the drive does not emulate; any arguments are accepted
// and the dispatcher rejects the message.
fn build_seek(_: &Words<'_>) -> Option<ParsedCommand> {
    Some(ParsedCommand::new(Command::Other(mci::MCI_SEEK)))
}

fn build_capability(_: &Words<'_>) -> Option<ParsedCommand> {
    Some(ParsedCommand::new(Command::Other(mci::MCI_GETDEVCAPS)))
}

fn build_open(words: &Words<'_>) -> Option<ParsedCommand> {
    let mut params = OpenParams::default();
    let mut args = words.args.iter();
    while let Some(arg) = args.next() {
        match arg.to_ascii_lowercase().as_str() {
            "alias" => params.alias = Some(args.next()?.to_string()),
            "type" => {
                args.next()?;
            }
            "shareable" => {}
            _ => return None,
        }
    }
    Some(ParsedCommand::new(Command::Open(params)))
}

fn build_info(words: &Words<'_>) -> Option<ParsedCommand> {
    (words.args.is_empty() || words.args_are(&["product"]))
        .then(|| ParsedCommand::new(Command::Info).replying(ReplyFormat::Text))
}

fn build_sysinfo(words: &Words<'_>) -> Option<ParsedCommand> {
    // `sysinfo cdaudio quantity [open]`, `sysinfo cdaudio name [N] [open]`
    let (item, format) = match words.args.first()?.to_ascii_lowercase().as_str() {
        "quantity" => (SysinfoItem::Quantity, ReplyFormat::Decimal),
        "name" => (SysinfoItem::Name, ReplyFormat::Text),
        _ => return None,
    };
    let trailing_ok = words.args[1..]
        .iter()
        .all(|a| a.eq_ignore_ascii_case("open") || a.parse::<u32>().is_ok());
    trailing_ok.then(|| ParsedCommand::new(Command::Sysinfo(item)).replying(format))
}

fn build_set(words: &Words<'_>) -> Option<ParsedCommand> {
    if words.args.len() != 3 || !starts_with(&words.args, &["time", "format"]) {
        return None;
    }
    let format = TimeFormat::from_keyword(words.args[2])?;
    let params = SetParams {
        time_format: format.code(),
    };
    Some(ParsedCommand::new(Command::Set(params)).with_flags(CommandFlags::SET_TIME_FORMAT))
}

fn build_play(words: &Words<'_>) -> Option<ParsedCommand> {
    let mut params = PlayParams::default();
    let mut flags = CommandFlags::empty();
    let mut args = words.args.iter();
    while let Some(arg) = args.next() {
        let value = parse_time(args.next()?)?;
        match arg.to_ascii_lowercase().as_str() {
            "from" => {
                params.from = value;
                flags |= CommandFlags::FROM;
            }
            "to" => {
                params.to = value;
                flags |= CommandFlags::TO;
            }
            _ => return None,
        }
    }
    Some(ParsedCommand::new(Command::Play(params)).with_flags(flags))
}

/// A time value: a plain number, `m:s:f` or `t:m:s:f`.
fn parse_time(word: &str) -> Option<u32> {
    let fields = word
        .split(':')
        .map(|f| f.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;
    match fields[..] {
        [value] => Some(value),
        [m, s, f] => Some(mci::make_msf(m, s, f)),
        [t, m, s, f] => Some(mci::make_tmsf(t, m, s, f)),
        _ => None,
    }
}

struct StatusItem {
    words: &'static [&'static str],
    /// Followed by a track number.
    track: bool,
    item: u32,
    format: ReplyFormat,
}

/// Status items, most specific first.
const STATUS_ITEMS: &[StatusItem] = &[
    StatusItem {
        words: &["number", "of", "tracks"],
        track: false,
        item: mci::MCI_STATUS_NUMBER_OF_TRACKS,
        format: ReplyFormat::Decimal,
    },
    StatusItem {
        words: &["length", "track"],
        track: true,
        item: mci::MCI_STATUS_LENGTH,
        format: ReplyFormat::Decimal,
    },
    StatusItem {
        words: &["length"],
        track: false,
        item: mci::MCI_STATUS_LENGTH,
        format: ReplyFormat::Decimal,
    },
    StatusItem {
        words: &["type", "track"],
        track: true,
        item: mci::MCI_CDA_STATUS_TYPE_TRACK,
        format: ReplyFormat::TrackType,
    },
    StatusItem {
        words: &["position", "track"],
        track: true,
        item: mci::MCI_STATUS_POSITION,
        format: ReplyFormat::Decimal,
    },
    StatusItem {
        words: &["position"],
        track: false,
        item: mci::MCI_STATUS_POSITION,
        format: ReplyFormat::Decimal,
    },
    StatusItem {
        words: &["mode"],
        track: false,
        item: mci::MCI_STATUS_MODE,
        format: ReplyFormat::Mode,
    },
    StatusItem {
        words: &["current", "track"],
        track: false,
        item: mci::MCI_STATUS_CURRENT_TRACK,
        format: ReplyFormat::Decimal,
    },
    StatusItem {
        words: &["media", "present"],
        track: false,
        item: mci::MCI_STATUS_MEDIA_PRESENT,
        format: ReplyFormat::Bool,
    },
    StatusItem {
        words: &["time", "format"],
        track: false,
        item: mci::MCI_STATUS_TIME_FORMAT,
        format: ReplyFormat::TimeFormat,
    },
    StatusItem {
        words: &["ready"],
        track: false,
        item: mci::MCI_STATUS_READY,
        format: ReplyFormat::Bool,
    },
];

fn build_status(words: &Words<'_>) -> Option<ParsedCommand> {
    STATUS_ITEMS.iter().find_map(|rule| {
        if !starts_with(&words.args, rule.words) {
            return None;
        }
        let rest = &words.args[rule.words.len()..];
        let (track, flags) = match (rule.track, rest) {
            (false, []) => (0, CommandFlags::STATUS_ITEM),
            (true, [n]) => (
                n.parse::<u32>().ok()?,
                CommandFlags::STATUS_ITEM | CommandFlags::TRACK,
            ),
            _ => return None,
        };
        let params = StatusParams {
            item: rule.item,
            track,
        };
        Some(
            ParsedCommand::new(Command::Status(params))
                .with_flags(flags)
                .replying(rule.format),
        )
    })
}

/// Parses command strings and runs them against one drive.
pub struct CommandParser {
    device: Arc<CdDevice>,
}

impl CommandParser {
    pub fn new(device: Arc<CdDevice>) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &Arc<CdDevice> {
        &self.device
    }

    /// Translate `text` without executing it.
    pub fn parse(&self, text: &str) -> Result<ParsedCommand, MciError> {
        let words = Words::split(text).ok_or(MciError::UnrecognizedCommand)?;
        let rule = VERBS
            .iter()
            .find(|r| r.verb == words.verb)
            .ok_or(MciError::UnrecognizedCommand)?;

        let device = words.device.unwrap_or_default();
        let alias = self.device.alias();
        let known = match rule.device {
            DeviceWord::Alias => device == alias,
            DeviceWord::AliasOrType => device == alias || device.eq_ignore_ascii_case(DEVICE_TYPE),
        };
        if !known {
            return Err(MciError::InvalidDeviceName(device.to_string()));
        }

        let parsed = (rule.build)(&words)
            .ok_or_else(|| MciError::UnrecognizedKeyword(text.trim().to_string()))?;
        Ok(parsed.with_flags(words.flags))
    }

    /// Parse and dispatch `text`, returning the textual reply.
    pub fn execute(&self, text: &str) -> Result<String, MciError> {
        let parsed = self.parse(text)?;
        debug!(command = text.trim(), flags = ?parsed.flags, "command string");
        let reply = self
            .device
            .dispatch(mci::MAGIC_DEVICE_ID, parsed.command, parsed.flags)?;
        Ok(parsed.format.render(reply))
    }
}
