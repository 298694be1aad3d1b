//! RetroGBm Core - session persistence and link-cable transport
//!
//! This crate surrounds a Game Boy emulation engine with everything that
//! outlives a single frame: save states, play statistics, cheats, and the
//! TCP relay that stands in for a link cable.
//!
//! # Architecture
//!
//! - [`Engine`] - Trait implemented by the native emulation core
//! - [`SessionController`] - Lifecycle, execution thread, save states, profile
//! - [`SlotRotation`] - Quick-save slot selection
//! - [`ProfileStore`] - `profile.json` persistence
//! - [`LinkCableTransport`] - Link-cable client over TCP

pub mod capture;
pub mod clock;
pub mod config;
pub mod engine;
pub mod layout;
pub mod library;
pub mod link;
pub mod profile_store;
pub mod session;
pub mod slots;
#[cfg(test)]
pub mod test_utils;

// Re-export core traits and types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use engine::{Engine, JoypadButton, LinkPort, SCREEN_HEIGHT, SCREEN_WIDTH, VideoFrame};
pub use layout::{DataDirProvider, DataLayout, DefaultDataDir};
pub use library::{LibraryEntry, RomFile, library_entries, rom_directory, scan_roms};
pub use link::{FrameHandler, LinkCableListener, LinkCableTransport, LinkError, LinkStatus};
pub use profile_store::{ProfileError, ProfileStore};
pub use session::{CheckpointReport, Session, SessionController, SessionError, SessionState};
pub use slots::{AUTOSAVE_SLOT, SlotRotation, SlotSummary};

// Re-export shared formats for convenience
pub use retrogbm_shared::{
    CheatCode, GamesharkCode, ProfileData, ProfileGameData, SaveStateHeader, rom_checksum,
};
