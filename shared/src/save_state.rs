//! Save-state file header.
//!
//! Every `.state` file starts with a fixed 64-byte little-endian header,
//! followed by the engine's opaque payload:
//!
//! | offset | size | field           |
//! |--------|------|-----------------|
//! | 0      | 8    | identifier      |
//! | 8      | 4    | version (i32)   |
//! | 12     | 8    | date_created    |
//! | 20     | 8    | date_modified   |
//! | 28     | 8    | time_played f64 |
//! | 36     | 28   | reserved        |

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Format tag at the start of every save-state file.
pub const SAVE_STATE_IDENTIFIER: [u8; 8] = *b"RETROGBM";
/// Header schema version written by this crate.
pub const SAVE_STATE_VERSION: i32 = 1;
/// Size of the encoded header in bytes.
pub const HEADER_LEN: usize = 64;
/// Size of the reserved block at the end of the header.
pub const RESERVED_LEN: usize = 28;
/// File extension for save-state files.
pub const STATE_EXTENSION: &str = "state";

/// Error decoding a save-state header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("save state header truncated: {len} of {HEADER_LEN} bytes")]
    Truncated { len: usize },
    #[error("save state identifier mismatch")]
    Malformed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveStateHeader {
    pub identifier: [u8; 8],
    pub version: i32,
    /// Unix seconds, set when the slot is first written.
    pub date_created: i64,
    /// Unix seconds, refreshed on every save.
    pub date_modified: i64,
    /// Cumulative seconds of play associated with the slot.
    pub time_played: f64,
    pub reserved: [u8; RESERVED_LEN],
}

impl SaveStateHeader {
    /// Create a header for a slot written for the first time at `now`.
    pub fn new(now: i64, time_played: f64) -> Self {
        Self {
            identifier: SAVE_STATE_IDENTIFIER,
            version: SAVE_STATE_VERSION,
            date_created: now,
            date_modified: now,
            time_played,
            reserved: [0; RESERVED_LEN],
        }
    }

    /// Header for overwriting an existing slot.
    ///
    /// Keeps `date_created` and the reserved block of the previous header.
    pub fn touched(&self, now: i64, time_played: f64) -> Self {
        Self {
            identifier: SAVE_STATE_IDENTIFIER,
            version: SAVE_STATE_VERSION,
            date_created: self.date_created,
            date_modified: now,
            time_played,
            reserved: self.reserved,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..8].copy_from_slice(&self.identifier);
        out[8..12].copy_from_slice(&self.version.to_le_bytes());
        out[12..20].copy_from_slice(&self.date_created.to_le_bytes());
        out[20..28].copy_from_slice(&self.date_modified.to_le_bytes());
        out[28..36].copy_from_slice(&self.time_played.to_le_bytes());
        out[36..HEADER_LEN].copy_from_slice(&self.reserved);
        out
    }

    /// Decode the header from the first 64 bytes of `bytes`.
    ///
    /// Trailing bytes (the engine payload) are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let Some(bytes) = bytes.get(..HEADER_LEN) else {
            return Err(FormatError::Truncated { len: bytes.len() });
        };

        let mut identifier = [0u8; 8];
        identifier.copy_from_slice(&bytes[0..8]);
        if identifier != SAVE_STATE_IDENTIFIER {
            return Err(FormatError::Malformed);
        }

        let mut reserved = [0u8; RESERVED_LEN];
        reserved.copy_from_slice(&bytes[36..HEADER_LEN]);

        Ok(Self {
            identifier,
            version: i32::from_le_bytes(le_array(&bytes[8..12])),
            date_created: i64::from_le_bytes(le_array(&bytes[12..20])),
            date_modified: i64::from_le_bytes(le_array(&bytes[20..28])),
            time_played: f64::from_le_bytes(le_array(&bytes[28..36])),
            reserved,
        })
    }
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(bytes);
    buf
}

/// Read just the header of a save-state file.
///
/// Returns `Ok(None)` when the file does not exist. A file that exists but
/// holds fewer than 64 bytes yields a `Truncated` format error wrapped in
/// `InvalidData`.
pub fn read_header(path: &Path) -> io::Result<Option<SaveStateHeader>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut buf = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64).read_to_end(&mut buf)?;

    SaveStateHeader::decode(&buf)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
