//! Data root resolution and the library command

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use retrogbm_core::library::{library_entries, rom_directory, scan_roms};
use retrogbm_core::{DataLayout, ProfileStore, config};

/// Resolve the data root: `--root`, then the config file, then the platform
/// data directory.
pub fn layout(root: Option<PathBuf>) -> Result<DataLayout> {
    let root = match root {
        Some(root) => root,
        None => config::load()
            .data_root()
            .context("Could not determine a data directory; pass --root")?,
    };
    tracing::debug!(root = %root.display(), "Using data root");
    Ok(DataLayout::new(root))
}

/// Arguments for the library command
#[derive(Args)]
pub struct LibraryArgs {
    /// Scan this directory instead of the profile's ROM directory
    #[arg(long)]
    pub roms: Option<PathBuf>,
}

/// Execute the library command
pub fn library(root: Option<PathBuf>, args: LibraryArgs) -> Result<()> {
    let layout = layout(root)?;
    let profile = ProfileStore::new(layout.profile_path()).load();
    let dir = args
        .roms
        .unwrap_or_else(|| rom_directory(&layout, &profile));

    let roms = scan_roms(&dir);
    if roms.is_empty() {
        println!("No ROMS found in directory {}", dir.display());
        return Ok(());
    }

    for entry in library_entries(roms, &profile) {
        println!(
            "{:<48} {:<14} {}",
            entry.rom.file_name, entry.last_played, entry.time_played
        );
    }
    Ok(())
}
