//! Session lifecycle and persistence

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use retrogbm_shared::fs::{MAX_ROM_BYTES, MAX_STATE_BYTES, read_file_with_limit};
use retrogbm_shared::{
    CheatCode, HEADER_LEN, ProfileCheatCode, ProfileData, SaveStateHeader, read_header,
    rom_checksum,
};

use super::error::SessionError;
use super::runner::{self, LoopControl};
use super::types::{CheckpointReport, Session, SessionState};
use crate::capture;
use crate::clock::{Clock, SystemClock};
use crate::config::EmulationConfig;
use crate::engine::{Engine, EngineLinkPort, JoypadButton, LinkPort, VideoFrame};
use crate::layout::{DataLayout, slot_path};
use crate::profile_store::{ProfileStore, tmp_path};
use crate::slots::{AUTOSAVE_SLOT, SlotRotation, validate_slot_name};

/// Drives one emulation engine through its lifecycle.
///
/// ```text
/// Idle -> Loaded -> Running <-> Paused -> Stopped
/// ```
///
/// The controller owns the engine and is used from a single controlling
/// thread. The engine runs on its own execution thread between `start` and
/// `stop`; every other access goes through the same mutex.
pub struct SessionController<E: Engine> {
    engine: Arc<Mutex<E>>,
    layout: DataLayout,
    profiles: ProfileStore,
    clock: Arc<dyn Clock>,
    state: SessionState,
    session: Option<Session>,
    profile: ProfileData,
    control: Arc<LoopControl>,
    runner: Option<JoinHandle<()>>,
    quick_slots: SlotRotation,
    /// Quick slot written most recently.
    quick_cursor: Option<String>,
    /// Set while the host is in the background. Play time stops here.
    suspended_at: Option<DateTime<Utc>>,
    skip_boot_rom: bool,
    paused_by_suspend: bool,
    sound_enabled: bool,
}

impl<E: Engine> SessionController<E> {
    pub fn new(engine: E, layout: DataLayout) -> Self {
        let profiles = ProfileStore::new(layout.profile_path());
        Self {
            engine: Arc::new(Mutex::new(engine)),
            layout,
            profiles,
            clock: Arc::new(SystemClock),
            state: SessionState::Idle,
            session: None,
            profile: ProfileData::default(),
            control: Arc::new(LoopControl::new()),
            runner: None,
            quick_slots: SlotRotation::quick_save(),
            quick_cursor: None,
            suspended_at: None,
            skip_boot_rom: true,
            paused_by_suspend: false,
            sound_enabled: true,
        }
    }

    /// Use `clock` for every timestamp the session records.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Take the emulation options from the config file.
    ///
    /// Sound applies immediately; `skip_boot_rom` applies to ROMs opened
    /// with [`open_rom`](Self::open_rom).
    pub fn apply_config(&mut self, config: &EmulationConfig) {
        self.skip_boot_rom = config.skip_boot_rom;
        self.set_sound_enabled(config.enable_sound);
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
        if self.session.is_some() {
            self.engine().set_audio_enabled(enabled);
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The profile as loaded with the ROM, including unsaved updates.
    pub fn profile(&self) -> &ProfileData {
        &self.profile
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut self.engine())
    }

    fn engine(&self) -> MutexGuard<'_, E> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require_session(&self) -> Result<&Session, SessionError> {
        self.session.as_ref().ok_or(SessionError::NoRomLoaded)
    }

    /// Require a loaded, not yet stopped session.
    fn require_active(&self, action: &'static str) -> Result<&Session, SessionError> {
        match self.state {
            SessionState::Loaded | SessionState::Running | SessionState::Paused => {
                self.require_session()
            }
            SessionState::Idle => Err(SessionError::NoRomLoaded),
            state => Err(SessionError::InvalidState { state, action }),
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidState {
            state: self.state,
            action,
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Read a ROM file and load it, naming the session after the file.
    pub fn load_rom_file(&mut self, path: &Path, skip_boot_rom: bool) -> Result<(), SessionError> {
        let bytes = read_file_with_limit(path, MAX_ROM_BYTES).map_err(SessionError::RomRead)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                SessionError::RomRead(anyhow::anyhow!("ROM path has no file name: {}", path.display()))
            })?;
        self.load_rom(&file_name, &bytes, skip_boot_rom)
    }

    /// [`load_rom_file`](Self::load_rom_file) with the configured boot ROM
    /// option.
    pub fn open_rom(&mut self, path: &Path) -> Result<(), SessionError> {
        self.load_rom_file(path, self.skip_boot_rom)
    }

    /// Load ROM bytes into the engine.
    ///
    /// Nothing is changed if the ROM is empty. Cheats stored under the ROM's
    /// checksum are pushed into the engine, disabled.
    pub fn load_rom(
        &mut self,
        file_name: &str,
        rom: &[u8],
        skip_boot_rom: bool,
    ) -> Result<(), SessionError> {
        if rom.is_empty() {
            return Err(SessionError::EmptyRom);
        }
        if !matches!(self.state, SessionState::Idle | SessionState::Stopped) {
            return Err(self.invalid("load a ROM"));
        }

        let checksum = rom_checksum(rom);

        let battery_dir = self.layout.battery_dir();
        fs::create_dir_all(&battery_dir).map_err(|source| SessionError::Io {
            path: battery_dir.clone(),
            source,
        })?;
        let battery_path = self.layout.battery_path(file_name);

        {
            let mut engine = self.engine();
            engine
                .load_rom(rom, &battery_path, skip_boot_rom)
                .map_err(SessionError::Engine)?;
            engine.set_audio_enabled(self.sound_enabled);
        }

        self.profile = self.profiles.load();
        if let Some(game) = self.profile.find_by_checksum(&checksum) {
            let cheats: Vec<CheatCode> = game.cheats.iter().map(CheatCode::from).collect();
            if !cheats.is_empty() {
                tracing::info!(count = cheats.len(), "Restored cheats from profile");
                self.engine().set_cheat_codes(cheats);
            }
        }

        let state_dir = self.layout.save_state_dir(file_name);
        self.quick_cursor = self
            .quick_slots
            .latest_slot(&state_dir)
            .map(str::to_string);

        tracing::info!(file_name, %checksum, skip_boot_rom, "ROM loaded");

        self.session = Some(Session::new(file_name, checksum, self.clock.now()));
        self.suspended_at = None;
        self.paused_by_suspend = false;
        self.state = SessionState::Loaded;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Start the execution thread. Repeated calls are no-ops; from `Paused`
    /// this resumes.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Running => Ok(()),
            SessionState::Paused => self.resume(),
            SessionState::Loaded => {
                self.control.arm();
                let handle = runner::spawn(Arc::clone(&self.engine), Arc::clone(&self.control))
                    .map_err(SessionError::Spawn)?;
                self.runner = Some(handle);

                let now = self.clock.now();
                if let Some(session) = self.session.as_mut() {
                    session.running = true;
                    session.start_segment(now);
                }
                self.state = SessionState::Running;
                tracing::info!("Session started");
                Ok(())
            }
            SessionState::Idle => Err(SessionError::NoRomLoaded),
            SessionState::Stopped => Err(self.invalid("start")),
        }
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Paused => Ok(()),
            SessionState::Running => {
                self.control.set_paused(true);
                self.engine().pause();

                let now = self.clock.now();
                if let Some(session) = self.session.as_mut() {
                    session.end_segment(now);
                }
                self.state = SessionState::Paused;
                tracing::debug!("Session paused");
                Ok(())
            }
            _ => Err(self.invalid("pause")),
        }
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Running => Ok(()),
            SessionState::Paused => {
                self.engine().resume();
                self.control.set_paused(false);

                let now = self.clock.now();
                if let Some(session) = self.session.as_mut() {
                    session.start_segment(now);
                }
                self.state = SessionState::Running;
                tracing::debug!("Session resumed");
                Ok(())
            }
            _ => Err(self.invalid("resume")),
        }
    }

    /// Halt the execution thread and stop the engine.
    ///
    /// Terminal for this ROM and safe to call any number of times.
    pub fn stop(&mut self) {
        if matches!(self.state, SessionState::Idle | SessionState::Stopped) {
            return;
        }

        self.control.halt();
        if let Some(handle) = self.runner.take() {
            if handle.join().is_err() {
                tracing::error!("Execution thread panicked");
            }
        }

        self.engine().stop();

        let now = self.clock.now();
        if let Some(session) = self.session.as_mut() {
            session.end_segment(now);
            session.running = false;
        }
        self.state = SessionState::Stopped;
        tracing::info!("Session stopped");
    }

    // ------------------------------------------------------------------
    // Host lifecycle
    // ------------------------------------------------------------------

    /// Host moved to the background: pause, autosave and record play time.
    pub fn on_suspend(&mut self) -> CheckpointReport {
        if self.session.is_none() {
            return CheckpointReport::no_rom();
        }

        if self.state == SessionState::Running && self.pause().is_ok() {
            self.paused_by_suspend = true;
        }
        if self.suspended_at.is_none() {
            self.suspended_at = Some(self.clock.now());
        }

        let report = CheckpointReport {
            save_state: self.write_slot(AUTOSAVE_SLOT),
            profile: self.update_profile(),
        };
        log_checkpoint("suspend", &report);
        report
    }

    /// Host is back in the foreground.
    ///
    /// After a suspend the session clock restarts, so time spent in the
    /// background is never credited.
    pub fn on_resume(&mut self) -> Result<(), SessionError> {
        if self.suspended_at.take().is_none() {
            return Ok(());
        }

        let now = self.clock.now();
        if let Some(session) = self.session.as_mut() {
            session.restart(now);
        }

        if std::mem::take(&mut self.paused_by_suspend) {
            self.resume()?;
        }
        Ok(())
    }

    /// Host is going away: autosave, stop the engine, record play time.
    ///
    /// When the host was suspended first, nothing after the suspend counts.
    pub fn on_terminate(&mut self) -> CheckpointReport {
        if self.session.is_none() {
            return CheckpointReport::no_rom();
        }

        let save_state = self.write_slot(AUTOSAVE_SLOT);
        self.stop();
        let report = CheckpointReport {
            save_state,
            profile: self.update_profile(),
        };
        log_checkpoint("terminate", &report);
        report
    }

    /// Credit whole minutes played to the profile and persist it.
    fn update_profile(&mut self) -> Result<(), SessionError> {
        let now = self.suspended_at.unwrap_or_else(|| self.clock.now());
        let cheats: Vec<ProfileCheatCode> = self
            .engine()
            .cheat_codes()
            .iter()
            .map(ProfileCheatCode::from)
            .collect();

        let session = self.session.as_mut().ok_or(SessionError::NoRomLoaded)?;
        let minutes = session.take_whole_minutes(now);

        let game = self
            .profile
            .find_or_create_game(&session.checksum, &session.file_name);
        game.last_played = Some(session.time_started);
        game.total_play_time_minutes += minutes;
        game.cheats = cheats;

        tracing::debug!(
            file_name = %session.file_name,
            minutes,
            total = game.total_play_time_minutes,
            "Updated play time"
        );

        self.profiles.save(&self.profile)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Save states
    // ------------------------------------------------------------------

    /// Write the next quick-save slot in rotation.
    pub fn quick_save(&mut self) -> Result<PathBuf, SessionError> {
        let slot = match &self.quick_cursor {
            Some(current) => self.quick_slots.after(current),
            None => self.quick_slots.first(),
        }
        .to_string();

        let path = self.write_slot(&slot)?;
        self.quick_cursor = Some(slot);
        Ok(path)
    }

    /// Load the quick-save slot written most recently.
    pub fn quick_load(&mut self) -> Result<(), SessionError> {
        self.require_active("load state")?;
        let slot = self
            .quick_cursor
            .clone()
            .ok_or_else(|| SessionError::NoSaveState {
                slot: self.quick_slots.first().to_string(),
            })?;
        self.read_slot(&slot)
    }

    /// Write a named slot.
    pub fn save_state(&mut self, slot: &str) -> Result<PathBuf, SessionError> {
        let path = self.write_slot(slot)?;
        if self.quick_slots.contains(slot) {
            self.quick_cursor = Some(slot.to_string());
        }
        Ok(path)
    }

    /// Load a named slot.
    pub fn load_state(&mut self, slot: &str) -> Result<(), SessionError> {
        self.read_slot(slot)
    }

    /// Directory holding the loaded ROM's slots.
    pub fn save_state_dir(&self) -> Result<PathBuf, SessionError> {
        Ok(self.layout.save_state_dir(&self.require_session()?.file_name))
    }

    fn write_slot(&mut self, slot: &str) -> Result<PathBuf, SessionError> {
        validate_slot_name(slot)?;
        let session = self.require_active("save state")?;
        let dir = self.layout.save_state_dir(&session.file_name);
        let path = slot_path(&dir, slot);
        let io_err = |source: io::Error| SessionError::SaveStateIo {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&dir).map_err(io_err)?;

        let now = self.clock.now();
        let time_played = session.play_seconds(now);
        let header = match read_header(&path) {
            Ok(Some(previous)) => previous.touched(now.timestamp(), time_played),
            Ok(None) => SaveStateHeader::new(now.timestamp(), time_played),
            Err(e) => {
                tracing::debug!(error = %e, "Replacing unreadable save state");
                SaveStateHeader::new(now.timestamp(), time_played)
            }
        };

        let tmp = tmp_path(&path).map_err(io_err)?;
        if let Err(e) = self.write_slot_file(&tmp, &path, &header) {
            if let Err(cleanup) = fs::remove_file(&tmp)
                && cleanup.kind() != io::ErrorKind::NotFound
            {
                tracing::warn!(path = %tmp.display(), error = %cleanup, "Failed to remove partial save state");
            }
            return Err(e);
        }

        tracing::info!(slot, path = %path.display(), time_played, "Save state written");
        Ok(path)
    }

    /// Write header and payload to `tmp`, then rename it over `path`.
    fn write_slot_file(
        &self,
        tmp: &Path,
        path: &Path,
        header: &SaveStateHeader,
    ) -> Result<(), SessionError> {
        let io_err = |source: io::Error| SessionError::SaveStateIo {
            path: path.to_path_buf(),
            source,
        };

        {
            let file = File::create(tmp).map_err(io_err)?;
            let mut out = BufWriter::new(file);
            out.write_all(&header.encode()).map_err(io_err)?;
            self.engine()
                .save_state(&mut out)
                .map_err(SessionError::Engine)?;
            let file = out.into_inner().map_err(|e| io_err(e.into_error()))?;
            file.sync_all().map_err(io_err)?;
        }

        #[cfg(windows)]
        {
            if path.exists() {
                // Windows rename fails if destination exists.
                fs::remove_file(path).map_err(io_err)?;
            }
        }

        fs::rename(tmp, path).map_err(io_err)
    }

    fn read_slot(&mut self, slot: &str) -> Result<(), SessionError> {
        validate_slot_name(slot)?;
        let session = self.require_active("load state")?;
        let path = self.layout.save_state_path(&session.file_name, slot);
        let io_err = |source: io::Error| SessionError::SaveStateIo {
            path: path.clone(),
            source,
        };

        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SessionError::NoSaveState {
                    slot: slot.to_string(),
                });
            }
            Err(e) => return Err(io_err(e)),
        };

        let mut header_bytes = Vec::with_capacity(HEADER_LEN);
        (&mut file)
            .take(HEADER_LEN as u64)
            .read_to_end(&mut header_bytes)
            .map_err(io_err)?;
        let header = SaveStateHeader::decode(&header_bytes)?;

        let mut payload = BufReader::new(file.take(MAX_STATE_BYTES));
        self.engine()
            .load_state(&mut payload)
            .map_err(SessionError::Engine)?;

        let now = self.clock.now();
        if let Some(session) = self.session.as_mut() {
            session.rebase(header.time_played, now);
        }

        tracing::info!(slot, path = %path.display(), "Save state loaded");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cheats, input, video
    // ------------------------------------------------------------------

    /// Replace the engine's cheats and persist them to the profile.
    pub fn set_cheats(&mut self, cheats: Vec<CheatCode>) -> Result<(), SessionError> {
        self.require_session()?;
        for cheat in &cheats {
            cheat.validate()?;
        }

        let stored: Vec<ProfileCheatCode> = cheats.iter().map(ProfileCheatCode::from).collect();
        let count = stored.len();
        self.engine().set_cheat_codes(cheats);

        let session = self.session.as_ref().ok_or(SessionError::NoRomLoaded)?;
        self.profile
            .find_or_create_game(&session.checksum, &session.file_name)
            .cheats = stored;
        self.profiles.save(&self.profile)?;
        tracing::info!(count, "Cheats updated");
        Ok(())
    }

    pub fn cheats(&self) -> Vec<CheatCode> {
        self.engine().cheat_codes()
    }

    pub fn press_button(&self, button: JoypadButton, pressed: bool) {
        self.engine().press_button(button, pressed);
    }

    pub fn video_frame(&self) -> VideoFrame {
        self.engine().video_frame()
    }

    /// Save the current frame under `<root>/Screenshots`.
    pub fn take_screenshot(&self) -> Result<PathBuf, SessionError> {
        let session = self.require_session()?;
        let frame = self.video_frame();
        capture::save_screenshot(&self.layout.screenshots_dir(), &session.file_name, &frame)
            .map_err(SessionError::Capture)
    }

    // ------------------------------------------------------------------
    // Link cable
    // ------------------------------------------------------------------

    /// Capability for delivering received link-cable bytes to the engine.
    pub fn link_port(&self) -> Arc<dyn LinkPort> {
        Arc::new(EngineLinkPort::new(Arc::clone(&self.engine)))
    }

    /// Receive bytes the engine sends over the link cable.
    ///
    /// Replaces any earlier subscriber. When the channel is full, bytes are
    /// dropped rather than stalling emulation.
    pub fn subscribe_link_output(&self, capacity: usize) -> Receiver<u8> {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        self.control.set_link_output(tx);
        rx
    }
}

impl<E: Engine> Drop for SessionController<E> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn log_checkpoint(kind: &str, report: &CheckpointReport) {
    if let Err(e) = &report.save_state {
        tracing::warn!(checkpoint = kind, error = %e, "Autosave failed");
    }
    if let Err(e) = &report.profile {
        tracing::warn!(checkpoint = kind, error = %e, "Profile update failed");
    }
}
