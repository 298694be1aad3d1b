//! Session state and play-time bookkeeping

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::error::SessionError;

/// Lifecycle of a [`SessionController`](super::SessionController).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No ROM loaded
    Idle,
    /// ROM loaded, execution thread not started
    Loaded,
    Running,
    Paused,
    /// Engine stopped; terminal until another ROM is loaded
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// The ROM currently loaded and the clocks attached to it.
#[derive(Debug, Clone)]
pub struct Session {
    pub file_name: String,
    /// SHA-256 of the ROM bytes, lowercase hex.
    pub checksum: String,
    /// Start of the current play session; becomes the profile's last-played.
    pub time_started: DateTime<Utc>,
    pub running: bool,
    /// Seconds of play carried over from earlier segments or a loaded state.
    play_base: f64,
    /// Start of the segment currently being played, while running.
    segment_start: Option<DateTime<Utc>>,
    /// Play time up to here has been credited to the profile.
    accounted_until: DateTime<Utc>,
}

impl Session {
    pub fn new(file_name: impl Into<String>, checksum: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            file_name: file_name.into(),
            checksum: checksum.into(),
            time_started: now,
            running: false,
            play_base: 0.0,
            segment_start: None,
            accounted_until: now,
        }
    }

    /// Seconds of play for save-state headers.
    pub fn play_seconds(&self, now: DateTime<Utc>) -> f64 {
        let current = self
            .segment_start
            .map(|start| seconds_between(start, now))
            .unwrap_or(0.0);
        self.play_base + current
    }

    pub(crate) fn start_segment(&mut self, now: DateTime<Utc>) {
        if self.segment_start.is_none() {
            self.segment_start = Some(now);
        }
    }

    pub(crate) fn end_segment(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.segment_start.take() {
            self.play_base += seconds_between(start, now);
        }
    }

    /// Continue counting from a loaded state's recorded play time.
    pub(crate) fn rebase(&mut self, time_played: f64, now: DateTime<Utc>) {
        self.play_base = time_played.max(0.0);
        if self.segment_start.is_some() {
            self.segment_start = Some(now);
        }
    }

    /// Restart the session clock, e.g. when the host comes back to the
    /// foreground. Time spent away is never credited.
    pub(crate) fn restart(&mut self, now: DateTime<Utc>) {
        self.time_started = now;
        self.accounted_until = now;
    }

    /// Whole minutes played since the last call. The remainder carries over.
    pub(crate) fn take_whole_minutes(&mut self, now: DateTime<Utc>) -> i64 {
        let minutes = (now - self.accounted_until).num_minutes().max(0);
        self.accounted_until += chrono::Duration::minutes(minutes);
        minutes
    }
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    ((end - start).num_milliseconds().max(0) as f64) / 1000.0
}

/// Outcome of a checkpoint (suspend or terminate).
///
/// The save-state write and the profile update are independent; one failing
/// does not prevent the other.
#[derive(Debug)]
pub struct CheckpointReport {
    pub save_state: Result<PathBuf, SessionError>,
    pub profile: Result<(), SessionError>,
}

impl CheckpointReport {
    pub(crate) fn no_rom() -> Self {
        Self {
            save_state: Err(SessionError::NoRomLoaded),
            profile: Err(SessionError::NoRomLoaded),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.save_state.is_ok() && self.profile.is_ok()
    }
}
