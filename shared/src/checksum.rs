//! ROM identity.

use sha2::{Digest, Sha256};

/// SHA-256 of the ROM bytes as lowercase hex (64 chars).
///
/// This is the key used to find a title's cheats in the profile.
pub fn rom_checksum(rom: &[u8]) -> String {
    hex::encode(Sha256::digest(rom))
}
