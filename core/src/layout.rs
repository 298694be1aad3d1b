//! On-disk layout of the data root
//!
//! ```text
//! <root>/RomData/<file_name>.save                    battery-backed RAM
//! <root>/SaveStates/<file_name>/<slot_name>.state    save states
//! <root>/profile.json                                play statistics and cheats
//! <root>/ROMS/                                       default ROM directory
//! <root>/Screenshots/                                captured frames
//! ```

use std::path::{Path, PathBuf};

use retrogbm_shared::save_state::STATE_EXTENSION;

/// Trait for providing the platform-specific data root.
///
/// Hosts pick where the emulator keeps its files (an app's documents
/// directory on Android, the XDG data directory on desktop).
pub trait DataDirProvider: Send + Sync {
    /// Returns `None` if no data directory can be determined.
    fn data_dir(&self) -> Option<PathBuf>;
}

/// Data root from the platform's project directories.
pub struct DefaultDataDir;

impl DataDirProvider for DefaultDataDir {
    fn data_dir(&self) -> Option<PathBuf> {
        crate::config::data_dir()
    }
}

/// Resolves every path the session layer reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_provider(provider: &dyn DataDirProvider) -> Option<Self> {
        provider.data_dir().map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn battery_dir(&self) -> PathBuf {
        self.root.join("RomData")
    }

    pub fn battery_path(&self, file_name: &str) -> PathBuf {
        self.battery_dir().join(format!("{file_name}.save"))
    }

    /// Directory holding every slot for one ROM.
    pub fn save_state_dir(&self, file_name: &str) -> PathBuf {
        self.root.join("SaveStates").join(file_name)
    }

    pub fn save_state_path(&self, file_name: &str, slot_name: &str) -> PathBuf {
        slot_path(&self.save_state_dir(file_name), slot_name)
    }

    pub fn profile_path(&self) -> PathBuf {
        self.root.join("profile.json")
    }

    pub fn default_rom_dir(&self) -> PathBuf {
        self.root.join("ROMS")
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.root.join("Screenshots")
    }
}

/// `<dir>/<slot_name>.state`
pub fn slot_path(dir: &Path, slot_name: &str) -> PathBuf {
    dir.join(format!("{slot_name}.{STATE_EXTENSION}"))
}
