//! Slots command - list save states for one ROM

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use retrogbm_core::slots::{AUTOSAVE_SLOT, SlotRotation, describe};

use crate::data;

/// Arguments for the slots command
#[derive(Args)]
pub struct SlotsArgs {
    /// ROM file name as stored under SaveStates/ (e.g. "Tetris.gb")
    pub rom: String,
}

/// Execute the slots command
pub fn execute(root: Option<PathBuf>, args: SlotsArgs) -> Result<()> {
    let layout = data::layout(root)?;
    let dir = layout.save_state_dir(&args.rom);
    for line in report(&dir) {
        println!("{line}");
    }
    Ok(())
}

fn report(dir: &Path) -> Vec<String> {
    let quick = SlotRotation::quick_save();
    let mut lines: Vec<String> = SlotRotation::manual()
        .summaries(dir)
        .iter()
        .chain(quick.summaries(dir).iter())
        .map(ToString::to_string)
        .collect();

    lines.push(describe(dir, AUTOSAVE_SLOT).to_string());
    lines.push(format!("Next quick save: {}", quick.next_slot(dir)));
    lines
}
