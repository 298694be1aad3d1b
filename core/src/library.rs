//! ROM library listing
//!
//! Scans the ROM directory for `.gb`/`.gbc` files and joins them with the
//! play statistics recorded in the profile.

use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use retrogbm_shared::ProfileData;
use retrogbm_shared::time_format::{format_last_played, format_time_played};

use crate::layout::DataLayout;

const ROM_EXTENSIONS: [&str; 2] = ["gb", "gbc"];

pub const NEVER_PLAYED: &str = "Never Played";
pub const NO_TIME_PLAYED: &str = "No Time Played";

/// A ROM file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomFile {
    pub file_name: String,
    pub path: PathBuf,
}

/// One row of the library view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub rom: RomFile,
    pub last_played: String,
    pub time_played: String,
}

/// ROM files directly inside `dir`, sorted by file name.
///
/// A missing or unreadable directory yields an empty list.
pub fn scan_roms(dir: &Path) -> Vec<RomFile> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::debug!(dir = %dir.display(), "ROM directory is not readable");
        return vec![];
    };

    let mut roms: Vec<RomFile> = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if !path.is_file() {
                return None;
            }
            let ext = path.extension()?.to_str()?.to_ascii_lowercase();
            if !ROM_EXTENSIONS.contains(&ext.as_str()) {
                return None;
            }
            let file_name = path.file_name()?.to_str()?.to_string();
            Some(RomFile { file_name, path })
        })
        .collect();

    roms.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    roms
}

/// Directory to scan: the profile's choice, else `<root>/ROMS`.
pub fn rom_directory(layout: &DataLayout, profile: &ProfileData) -> PathBuf {
    profile
        .rom_directory()
        .map(PathBuf::from)
        .unwrap_or_else(|| layout.default_rom_dir())
}

/// Library rows in the local timezone.
pub fn library_entries(roms: Vec<RomFile>, profile: &ProfileData) -> Vec<LibraryEntry> {
    library_entries_in(roms, profile, &Local)
}

/// Library rows, with dates rendered in `tz`.
///
/// Statistics are matched by file name; a record that was never played
/// keeps the placeholders.
pub fn library_entries_in<Tz: TimeZone>(
    roms: Vec<RomFile>,
    profile: &ProfileData,
    tz: &Tz,
) -> Vec<LibraryEntry>
where
    Tz::Offset: std::fmt::Display,
{
    roms.into_iter()
        .map(|rom| {
            let played = profile
                .find_by_file_name(&rom.file_name)
                .and_then(|game| game.last_played.map(|at| (at, game.total_play_time_minutes)));

            let (last_played, time_played) = match played {
                Some((at, minutes)) => (format_last_played(&at, tz), format_time_played(minutes)),
                None => (NEVER_PLAYED.to_string(), NO_TIME_PLAYED.to_string()),
            };

            LibraryEntry {
                rom,
                last_played,
                time_played,
            }
        })
        .collect()
}
