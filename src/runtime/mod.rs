use std::io;

use tracing::{info, warn};

use crate::Cli;
use crate::device::Command;
use crate::mci::{self, CommandFlags};
use crate::parser::CommandParser;

mod repl;
mod settings;
mod startup;

pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (settings, warning) = settings::load_settings(cli.config);

    if cli.dump_config {
        print!("{}", toml::to_string_pretty(&settings)?);
        return Ok(());
    }

    startup::init_tracing(&settings.log)?;
    if let Some(msg) = warning {
        warn!("{msg}");
    }

    let music_dir = cli
        .music_dir
        .unwrap_or_else(|| settings.catalog.music_folder.clone());
    info!(dir = %music_dir.display(), "starting virtual CD drive");

    let drive = startup::assemble(&settings, &music_dir);
    repl::spawn_notification_printer(drive.notifications)?;

    let parser = CommandParser::new(drive.device.clone());
    let result = repl::run(&parser, &drive.aux, io::stdin().lock(), &mut io::stdout());

    // Stop playback and release the output whichever way the loop ended.
    drive
        .device
        .dispatch(mci::MAGIC_DEVICE_ID, Command::Close, CommandFlags::empty())?;
    info!("bye");
    Ok(result?)
}
