//! Profile document types.
//!
//! Stored as `profile.json` in the data root. Keys are camelCase and
//! timestamps use `yyyy-MM-dd'T'HH:mm:ss.SSSZ` so documents written by the
//! Android application load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cheats::CHEAT_LINE_SEPARATOR;

/// Installation-wide options kept alongside play statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOptions {
    /// Directory (or document tree URI) scanned for ROMs.
    #[serde(default)]
    pub rom_directories: String,
}

/// A cheat as stored in the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCheatCode {
    pub name: String,
    /// One or more code lines joined with `\r\n`.
    pub code: String,
}

impl ProfileCheatCode {
    pub fn from_lines(name: impl Into<String>, lines: &[String]) -> Self {
        Self {
            name: name.into(),
            code: lines.join(CHEAT_LINE_SEPARATOR),
        }
    }

    /// Individual code lines, accepting either `\r\n` or `\n` separators.
    pub fn lines(&self) -> Vec<String> {
        self.code
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Play statistics and cheats for one title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileGameData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub file_name: String,
    /// SHA-256 of the ROM bytes, lowercase hex.
    #[serde(default)]
    pub checksum: String,
    #[serde(default, with = "profile_date")]
    pub last_played: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_play_time_minutes: i64,
    #[serde(default)]
    pub cheats: Vec<ProfileCheatCode>,
}

impl ProfileGameData {
    /// A fresh record with no play time and no cheats.
    pub fn new(file_name: &str, checksum: &str) -> Self {
        Self {
            name: file_name.to_string(),
            file_name: file_name.to_string(),
            checksum: checksum.to_string(),
            last_played: None,
            total_play_time_minutes: 0,
            cheats: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ProfileOptions>,
    #[serde(default)]
    pub game_data: Vec<ProfileGameData>,
}

impl ProfileData {
    /// Record for `file_name`, appending a zeroed one if absent.
    ///
    /// Play time aggregates by file name, so a re-dumped ROM with a new
    /// checksum keeps accumulating on the same record.
    pub fn find_or_create_game(&mut self, checksum: &str, file_name: &str) -> &mut ProfileGameData {
        let index = match self.game_data.iter().position(|g| g.file_name == file_name) {
            Some(index) => index,
            None => {
                self.game_data.push(ProfileGameData::new(file_name, checksum));
                self.game_data.len() - 1
            }
        };
        &mut self.game_data[index]
    }

    /// Record whose ROM checksum matches. Used when loading cheats.
    pub fn find_by_checksum(&self, checksum: &str) -> Option<&ProfileGameData> {
        self.game_data.iter().find(|g| g.checksum == checksum)
    }

    pub fn find_by_file_name(&self, file_name: &str) -> Option<&ProfileGameData> {
        self.game_data.iter().find(|g| g.file_name == file_name)
    }

    pub fn rom_directory(&self) -> Option<&str> {
        self.options
            .as_ref()
            .map(|o| o.rom_directories.as_str())
            .filter(|dir| !dir.is_empty())
    }

    pub fn set_rom_directory(&mut self, dir: impl Into<String>) {
        self.options.get_or_insert_with(ProfileOptions::default).rom_directories = dir.into();
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Serde adapter for the profile's timestamp pattern.
mod profile_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };

        // Older documents may carry RFC 3339 timestamps instead.
        DateTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(&raw))
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}
