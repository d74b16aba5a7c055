use std::path::PathBuf;

use clap::Parser;

mod catalog;
mod config;
mod device;
mod engine;
mod error;
mod mci;
mod parser;
mod runtime;
mod timefmt;
mod volume;

/// Virtual CD-audio drive playing `NN.ogg` files from a folder.
#[derive(Parser, Debug)]
#[command(name = "cdemu")]
#[command(version, about)]
pub struct Cli {
    /// Folder holding the track files (overrides `catalog.music_folder`)
    music_dir: Option<PathBuf>,

    /// Config file to load instead of the default location
    #[arg(short, long, env = "CDEMU_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Print the effective settings as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run(Cli::parse())
}
