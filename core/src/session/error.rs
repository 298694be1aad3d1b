//! Session error types

use std::io;
use std::path::PathBuf;

use retrogbm_shared::{CheatError, FormatError};
use thiserror::Error;

use super::types::SessionState;
use crate::profile_store::ProfileError;

/// Errors surfaced to the caller of a session operation.
///
/// None of these end the session; the emulation keeps running.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("ROM is empty")]
    EmptyRom,
    #[error("failed to read ROM: {0:#}")]
    RomRead(anyhow::Error),
    #[error("no ROM loaded")]
    NoRomLoaded,
    #[error("cannot {action} while {state}")]
    InvalidState {
        state: SessionState,
        action: &'static str,
    },
    #[error("save state I/O failed for {}: {source}", .path.display())]
    SaveStateIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid save state: {0}")]
    SaveStateFormat(#[from] FormatError),
    #[error("invalid slot name '{slot}'")]
    InvalidSlot { slot: String },
    #[error("no save state in slot '{slot}'")]
    NoSaveState { slot: String },
    #[error("engine error: {0:#}")]
    Engine(anyhow::Error),
    #[error("failed to start execution thread: {0}")]
    Spawn(#[source] io::Error),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Cheat(#[from] CheatError),
    #[error("screenshot failed: {0:#}")]
    Capture(anyhow::Error),
}
