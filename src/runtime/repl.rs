//! Line-oriented control surface: one command string per line.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::Receiver;
use std::thread;

use tracing::debug;

use crate::catalog::Catalog;
use crate::device::Notification;
use crate::parser::CommandParser;
use crate::volume::AuxDevice;

const HELP: &str = "\
commands are MCI strings, e.g.
  open cdaudio
  set cdaudio time format tmsf
  play cdaudio from 2 notify
  status cdaudio mode
meta:
  .tracks            list the disc
  .volume <percent>  set the aux volume
  .aux               describe the aux volume device
  .help              this text
  .quit              close the drive and exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Read command strings from `input` until EOF or `.quit`.
pub fn run(
    parser: &CommandParser,
    aux: &AuxDevice,
    input: impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    for line in input.lines() {
        if handle_line(line?.trim(), parser, aux, out)? == Flow::Quit {
            break;
        }
        out.flush()?;
    }
    Ok(())
}

fn handle_line(
    line: &str,
    parser: &CommandParser,
    aux: &AuxDevice,
    out: &mut impl Write,
) -> io::Result<Flow> {
    if line.is_empty() || line.starts_with('#') {
        return Ok(Flow::Continue);
    }

    if let Some(meta) = line.strip_prefix('.') {
        let mut words = meta.split_whitespace();
        match (words.next(), words.next()) {
            (Some("quit" | "exit"), _) => return Ok(Flow::Quit),
            (Some("help"), _) => writeln!(out, "{HELP}")?,
            (Some("tracks"), _) => {
                for row in track_listing(parser.device().catalog()) {
                    writeln!(out, "{row}")?;
                }
            }
            (Some("volume"), Some(arg)) => match arg.parse::<u8>() {
                Ok(percent) if percent <= 100 => {
                    aux.set_percent(percent);
                    writeln!(out, "volume {percent}")?;
                }
                _ => writeln!(out, "error: volume must be 0-100")?,
            },
            (Some("volume"), None) => writeln!(out, "volume {:#010x}", aux.volume())?,
            (Some("aux"), _) => {
                let caps = aux.caps();
                writeln!(
                    out,
                    "{} aux device(s): {} (mid {}, pid {}, driver {}, {:?}, volume {})",
                    aux.num_devs(),
                    caps.name,
                    caps.manufacturer_id,
                    caps.product_id,
                    caps.driver_version,
                    caps.technology,
                    if caps.supports_volume { "yes" } else { "no" },
                )?;
            }
            _ => writeln!(out, "error: unknown meta command .{meta}")?,
        }
        return Ok(Flow::Continue);
    }

    match parser.execute(line) {
        Ok(reply) if reply.is_empty() => {}
        Ok(reply) => writeln!(out, "{reply}")?,
        Err(e) => writeln!(out, "error {}: {e}", e.code())?,
    }
    Ok(Flow::Continue)
}

fn track_listing(catalog: &Catalog) -> Vec<String> {
    let summary = catalog.summary();
    let mut rows = vec![format!(
        "{} tracks reported, {} playable, disc length {}",
        summary.total,
        catalog.present().count(),
        clock(catalog.disc_length())
    )];
    for slot in 1..catalog.len() {
        let Some(track) = catalog.get(slot) else {
            continue;
        };
        rows.push(match track.path() {
            Some(path) => format!(
                "{slot:02}  {:>6}  @{:>6}  {}",
                clock(track.length),
                clock(track.position),
                path.display()
            ),
            None => format!("{slot:02}  data    @{:>6}", clock(track.position)),
        });
    }
    rows
}

fn clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Print notifications on stdout as they arrive.
pub fn spawn_notification_printer(rx: Receiver<Notification>) -> io::Result<()> {
    thread::Builder::new()
        .name("cdemu-notify".to_string())
        .spawn(move || {
            for note in rx {
                debug!(status = note.status.name(), "notification");
                let mut stdout = io::stdout().lock();
                let _ = writeln!(
                    stdout,
                    "notify {} {:#x}",
                    note.status.name(),
                    note.device_id
                );
                let _ = stdout.flush();
            }
        })?;
    Ok(())
}
