//! Inspect and checksum commands

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::{Path, PathBuf};

use retrogbm_shared::fs::{MAX_ROM_BYTES, read_file_with_limit};
use retrogbm_shared::time_format::format_slot_time_played;
use retrogbm_shared::{SaveStateHeader, read_header, rom_checksum};

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// Save-state file to decode
    pub path: PathBuf,
}

/// Arguments for the checksum command
#[derive(Args)]
pub struct ChecksumArgs {
    /// ROM file
    pub rom: PathBuf,
}

/// Execute the inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    let header = load_header(&args.path)?;
    print!("{}", describe(&header));
    Ok(())
}

/// Execute the checksum command
pub fn checksum(args: ChecksumArgs) -> Result<()> {
    let rom = read_file_with_limit(&args.rom, MAX_ROM_BYTES)?;
    println!("{}  {}", rom_checksum(&rom), args.rom.display());
    Ok(())
}

fn load_header(path: &Path) -> Result<SaveStateHeader> {
    match read_header(path).with_context(|| format!("Failed to read {}", path.display()))? {
        Some(header) => Ok(header),
        None => bail!("No such file: {}", path.display()),
    }
}

fn timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| format!("invalid ({secs})"))
}

fn describe(header: &SaveStateHeader) -> String {
    format!(
        "identifier:    {}\n\
         version:       {}\n\
         date created:  {}\n\
         date modified: {}\n\
         time played:   {} ({:.1} s)\n",
        String::from_utf8_lossy(&header.identifier),
        header.version,
        timestamp(header.date_created),
        timestamp(header.date_modified),
        format_slot_time_played(header.time_played),
        header.time_played,
    )
}
