//! Persistence for `profile.json`

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use retrogbm_shared::ProfileData;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("profile could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reads and writes the profile document at a fixed path.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the profile.
    ///
    /// A missing file is created with an empty profile. A file that cannot
    /// be read or parsed is left alone and an empty profile is returned.
    pub fn load(&self) -> ProfileData {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let profile = ProfileData::default();
                match self.save(&profile) {
                    Ok(()) => tracing::info!(path = %self.path.display(), "Created new profile"),
                    Err(e) => {
                        tracing::warn!(path = %self.path.display(), error = %e, "Failed to create profile")
                    }
                }
                return profile;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read profile");
                return ProfileData::default();
            }
        };

        match ProfileData::from_json(&content) {
            Ok(profile) => {
                tracing::debug!(games = profile.game_data.len(), "Loaded profile");
                profile
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to parse profile");
                ProfileData::default()
            }
        }
    }

    /// Overwrite the profile on disk.
    ///
    /// Written to a temporary file first and renamed into place, so a crash
    /// never leaves a half-written document.
    pub fn save(&self, profile: &ProfileData) -> Result<(), ProfileError> {
        let json = profile.to_json()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = tmp_path(&self.path)?;
        if let Err(e) = self.replace_with(&tmp_path, json.as_bytes()) {
            if let Err(cleanup) = fs::remove_file(&tmp_path)
                && cleanup.kind() != io::ErrorKind::NotFound
            {
                tracing::warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove partial profile");
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn replace_with(&self, tmp_path: &Path, contents: &[u8]) -> io::Result<()> {
        {
            let mut f = fs::File::create(tmp_path)?;
            f.write_all(contents)?;
            f.sync_all()?;
        }

        #[cfg(windows)]
        {
            if self.path.exists() {
                // Windows rename fails if destination exists.
                fs::remove_file(&self.path)?;
            }
        }

        fs::rename(tmp_path, &self.path)
    }
}

/// `<path>.tmp` next to the target.
pub(crate) fn tmp_path(path: &Path) -> io::Result<PathBuf> {
    match path.file_name() {
        Some(name) => {
            let mut tmp_name = OsString::from(name);
            tmp_name.push(".tmp");
            Ok(path.with_file_name(tmp_name))
        }
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "path has no file name",
        )),
    }
}
