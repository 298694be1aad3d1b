//! Filesystem helpers shared by the runtime and tools.

use std::path::Path;

use anyhow::{Context, Result};

/// Maximum allowed ROM size for reading into memory.
///
/// The largest MBC5 cartridges are 8 MiB; anything far beyond that is not a ROM.
pub const MAX_ROM_BYTES: u64 = 32 * 1024 * 1024; // 32 MiB
/// Maximum allowed save-state size for reading into memory.
pub const MAX_STATE_BYTES: u64 = 64 * 1024 * 1024; // 64 MiB

/// Read a file into memory with a size cap.
pub fn read_file_with_limit(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;
    let len = metadata.len();
    if len > max_bytes {
        anyhow::bail!(
            "File too large: {} ({} bytes, max {} bytes)",
            path.display(),
            len,
            max_bytes
        );
    }
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}
