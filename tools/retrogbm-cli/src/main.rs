//! RetroGBm CLI - Inspect save data and test the link cable
//!
//! # Commands
//!
//! - `retrogbm inspect <file.state>` - Decode a save-state header
//! - `retrogbm checksum <rom>` - Print the checksum profiles are keyed by
//! - `retrogbm slots <rom file name>` - List save-state slots for a ROM
//! - `retrogbm library` - List ROMs with their play statistics
//! - `retrogbm link-echo` - Run a link-cable peer that echoes every byte
//! - `retrogbm link-send <bytes>` - Send bytes to a link-cable peer
//!
//! # Data root
//!
//! Commands that read the data root use `--root` when given, otherwise
//! `[paths] data_root` from `config.toml`, otherwise the platform data
//! directory.

mod data;
mod inspect;
mod link;
mod slots;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// RetroGBm CLI - Inspect save data and test the link cable
#[derive(Parser)]
#[command(name = "retrogbm")]
#[command(about = "Inspect RetroGBm save data and test the link cable")]
#[command(version)]
struct Cli {
    /// Data root (defaults to the configured or platform data directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode the header of a save-state file
    Inspect(inspect::InspectArgs),

    /// Print the SHA-256 checksum of a ROM
    Checksum(inspect::ChecksumArgs),

    /// List save-state slots for a ROM
    Slots(slots::SlotsArgs),

    /// List ROMs with play statistics
    Library(data::LibraryArgs),

    /// Run a link-cable peer that echoes every byte back
    LinkEcho(link::LinkEchoArgs),

    /// Connect to a link-cable peer and send bytes
    LinkSend(link::LinkSendArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Checksum(args) => inspect::checksum(args),
        Commands::Slots(args) => slots::execute(cli.root, args),
        Commands::Library(args) => data::library(cli.root, args),
        Commands::LinkEcho(args) => link::echo(args),
        Commands::LinkSend(args) => link::send(args),
    }
}
