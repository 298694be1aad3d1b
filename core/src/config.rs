//! Configuration management (config.toml)
//!
//! Handles loading, saving, and providing defaults for emulator options.
//! Settings are stored in TOML format in the platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub emulation: EmulationConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Options applied when a ROM is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulationConfig {
    /// Skip the boot ROM logo sequence (default: true)
    #[serde(default = "default_true")]
    pub skip_boot_rom: bool,
    /// Enable audio output (default: true)
    #[serde(default = "default_true")]
    pub enable_sound: bool,
}

/// Link-cable settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Peer address used for the last successful connection
    #[serde(default)]
    pub last_peer_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Overrides the platform data directory when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for EmulationConfig {
    fn default() -> Self {
        Self {
            skip_boot_rom: default_true(),
            enable_sound: default_true(),
        }
    }
}

impl Config {
    /// Data root from the config, falling back to the platform directory.
    pub fn data_root(&self) -> Option<PathBuf> {
        self.paths.data_root.clone().or_else(data_dir)
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\RetroGBm\config`
/// On macOS: `~/Library/Application Support/io.retrogbm.RetroGBm`
/// On Linux: `~/.config/RetroGBm`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.retrogbm", "", "RetroGBm")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory.
///
/// On Linux: `~/.local/share/RetroGBm`
///
/// This is the default root for ROM data, save states and the profile.
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.retrogbm", "", "RetroGBm")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Loads `config.toml` from the platform's configuration directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    config_dir()
        .map(|dir| load_from(&dir.join("config.toml")))
        .unwrap_or_default()
}

/// Loads a config file, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };

    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
            Config::default()
        }
    }
}

/// Saves `config.toml` to the platform's configuration directory.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// cannot be written.
pub fn save(config: &Config) -> std::io::Result<()> {
    match config_dir() {
        Some(dir) => save_to(&dir.join("config.toml"), config),
        None => Ok(()),
    }
}

pub fn save_to(path: &Path, config: &Config) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, content)
}
