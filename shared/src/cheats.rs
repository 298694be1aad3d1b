//! Cheat codes.
//!
//! The engine works with a list of code lines per cheat; the profile keeps
//! the same lines joined into a single string.

use crate::profile::ProfileCheatCode;

/// Separator between code lines in the profile document.
pub const CHEAT_LINE_SEPARATOR: &str = "\r\n";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheatError {
    #[error("cheat '{name}' has no code lines")]
    Empty { name: String },
    #[error("invalid GameShark code '{line}': expected 8 hex digits")]
    InvalidCode { line: String },
}

/// A cheat as held by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheatCode {
    pub name: String,
    pub lines: Vec<String>,
    pub enabled: bool,
}

impl CheatCode {
    /// Validate every line as a GameShark code.
    pub fn validate(&self) -> Result<(), CheatError> {
        if self.lines.is_empty() {
            return Err(CheatError::Empty {
                name: self.name.clone(),
            });
        }
        for line in &self.lines {
            GamesharkCode::parse(line)?;
        }
        Ok(())
    }
}

impl From<&ProfileCheatCode> for CheatCode {
    /// Cheats restored from the profile start disabled.
    fn from(cheat: &ProfileCheatCode) -> Self {
        Self {
            name: cheat.name.clone(),
            lines: cheat.lines(),
            enabled: false,
        }
    }
}

impl From<&CheatCode> for ProfileCheatCode {
    fn from(cheat: &CheatCode) -> Self {
        ProfileCheatCode::from_lines(cheat.name.clone(), &cheat.lines)
    }
}

/// A decoded GameShark code `BBVVLLHH`: RAM bank, value, little-endian address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamesharkCode {
    pub bank: u8,
    pub value: u8,
    pub address: u16,
}

impl GamesharkCode {
    pub fn parse(line: &str) -> Result<Self, CheatError> {
        let trimmed = line.trim();
        let invalid = || CheatError::InvalidCode {
            line: line.to_string(),
        };

        if trimmed.len() != 8 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let raw = u32::from_str_radix(trimmed, 16).map_err(|_| invalid())?;

        Ok(Self {
            bank: (raw >> 24) as u8,
            value: (raw >> 16) as u8,
            address: (((raw & 0xFF) << 8) | ((raw >> 8) & 0xFF)) as u16,
        })
    }
}
