//! Shared data formats for the RetroGBm session layer.
//!
//! Everything here is pure data handling with no threads or sockets, so it
//! can be used by both the runtime (`retrogbm-core`) and the CLI tools.

pub mod checksum;
pub mod cheats;
pub mod fs;
pub mod profile;
pub mod save_state;
pub mod time_format;

pub use checksum::rom_checksum;
pub use cheats::{CheatCode, CheatError, GamesharkCode};
pub use profile::{ProfileCheatCode, ProfileData, ProfileGameData, ProfileOptions};
pub use save_state::{FormatError, HEADER_LEN, SaveStateHeader, read_header};
pub use time_format::{format_slot_time_played, format_time_played};

/// TCP port the link-cable peer listens on.
pub const LINK_CABLE_PORT: u16 = 54000;

/// First byte of every link-cable frame.
pub const LINK_FRAME_MARKER: u8 = 0xFF;
