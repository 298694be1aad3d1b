//! Save-state slot selection
//!
//! Slots are plain `.state` files named after the slot. The quick-save
//! rotation overwrites the slot after the most recently written one, so the
//! three newest quick saves are always on disk.

use std::fmt;
use std::path::Path;

use chrono::{Local, TimeZone};
use retrogbm_shared::time_format::{format_slot_date, format_slot_time_played};
use retrogbm_shared::{SaveStateHeader, read_header};

use crate::layout::slot_path;
use crate::session::SessionError;

/// Slot written when the host backgrounds or destroys the session.
pub const AUTOSAVE_SLOT: &str = "AutoSave";

const QUICK_SAVE_SLOTS: usize = 3;
const MANUAL_SLOTS: usize = 9;

/// Ordered list of slot names that are cycled through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRotation {
    names: Vec<String>,
}

impl SlotRotation {
    /// `Quick Save 1` .. `Quick Save 3`
    pub fn quick_save() -> Self {
        Self::numbered("Quick Save", QUICK_SAVE_SLOTS)
    }

    /// `Slot 1` .. `Slot 9`, shown by the slot browser.
    pub fn manual() -> Self {
        Self::numbered("Slot", MANUAL_SLOTS)
    }

    fn numbered(prefix: &str, count: usize) -> Self {
        Self {
            names: (1..=count).map(|i| format!("{prefix} {i}")).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn first(&self) -> &str {
        &self.names[0]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Slot following `name`, wrapping. Unknown names map to the first slot.
    pub fn after(&self, name: &str) -> &str {
        match self.names.iter().position(|n| n == name) {
            Some(i) => &self.names[(i + 1) % self.names.len()],
            None => self.first(),
        }
    }

    /// Slot to overwrite next: the one after the most recently modified.
    ///
    /// Slots that are missing or fail to decode count as oldest. With no
    /// readable slot at all the first slot is returned.
    pub fn next_slot(&self, dir: &Path) -> &str {
        match self.latest_slot(dir) {
            Some(latest) => self.after(latest),
            None => self.first(),
        }
    }

    /// Most recently modified readable slot, if any.
    pub fn latest_slot(&self, dir: &Path) -> Option<&str> {
        let mut stamped: Vec<(usize, i64)> = self
            .names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| modified_at(dir, name).map(|ts| (i, ts)))
            .collect();

        // Stable: equal timestamps keep rotation order, so the later slot wins.
        stamped.sort_by_key(|&(_, ts)| ts);
        stamped.last().map(|&(i, _)| self.names[i].as_str())
    }

    /// One summary per slot, in rotation order.
    pub fn summaries(&self, dir: &Path) -> Vec<SlotSummary> {
        self.names.iter().map(|name| describe(dir, name)).collect()
    }
}

/// Slot names become file names inside the ROM's save-state directory, so
/// they must be a single plain path component.
pub fn validate_slot_name(name: &str) -> Result<(), SessionError> {
    let valid = !name.trim().is_empty()
        && !name.contains("..")
        && !name.contains(['/', '\\', ':', '\0']);
    if valid {
        Ok(())
    } else {
        Err(SessionError::InvalidSlot {
            slot: name.to_string(),
        })
    }
}

fn modified_at(dir: &Path, name: &str) -> Option<i64> {
    let path = slot_path(dir, name);
    match read_header(&path) {
        Ok(header) => header.map(|h| h.date_modified),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Unreadable save state slot");
            None
        }
    }
}

/// What the slot browser shows for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSummary {
    pub name: String,
    pub header: Option<SaveStateHeader>,
}

impl SlotSummary {
    pub fn is_empty(&self) -> bool {
        self.header.is_none()
    }

    /// `"Slot 1 - 2024/08/20 - 2 hours 30 minutes"` or `"Slot 1 - Empty"`.
    pub fn label_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: fmt::Display,
    {
        match &self.header {
            Some(header) => format!(
                "{} - {} - {}",
                self.name,
                format_slot_date(header.date_modified, tz),
                format_slot_time_played(header.time_played)
            ),
            None => format!("{} - Empty", self.name),
        }
    }
}

impl fmt::Display for SlotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label_in(&Local))
    }
}

/// Summarise one slot. Unreadable slots are reported as empty.
pub fn describe(dir: &Path, name: &str) -> SlotSummary {
    let path = slot_path(dir, name);
    let header = match read_header(&path) {
        Ok(header) => header,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable save state");
            None
        }
    };
    SlotSummary {
        name: name.to_string(),
        header,
    }
}
