//! Shared test utilities for unit tests

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::engine::{CheatCode, Engine, JoypadButton, VideoFrame};

// ============================================================================
// Mock Engine
// ============================================================================

/// In-memory engine double.
///
/// Its "memory" is a byte vector: `save_state` writes it verbatim and
/// `load_state` replaces it with whatever follows the header.
#[derive(Debug, Default)]
pub struct MockEngine {
    pub rom: Vec<u8>,
    pub battery_path: Option<PathBuf>,
    pub skip_boot_rom: bool,
    pub memory: Vec<u8>,
    pub ticks: u64,
    pub running: bool,
    pub paused: bool,
    pub stop_calls: u32,
    pub audio_enabled: bool,
    pub cheats: Vec<CheatCode>,
    pub buttons: Vec<(JoypadButton, bool)>,
    /// Bytes received from the link-cable peer
    pub link_in: Vec<u8>,
    /// Bytes the emulated serial port will send, one per tick
    pub link_out: VecDeque<u8>,
    /// Make `load_rom` fail
    pub fail_load: bool,
    /// Make `save_state` fail
    pub fail_save: bool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose memory starts as `memory`.
    pub fn with_memory(memory: &[u8]) -> Self {
        Self {
            memory: memory.to_vec(),
            ..Self::default()
        }
    }
}

impl Engine for MockEngine {
    fn load_rom(&mut self, rom: &[u8], battery_path: &Path, skip_boot_rom: bool) -> Result<()> {
        if self.fail_load {
            bail!("mock engine refused the ROM");
        }
        self.rom = rom.to_vec();
        self.battery_path = Some(battery_path.to_path_buf());
        self.skip_boot_rom = skip_boot_rom;
        self.running = true;
        Ok(())
    }

    fn tick(&mut self) {
        self.ticks += 1;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn stop(&mut self) {
        self.running = false;
        self.stop_calls += 1;
    }

    fn save_state(&mut self, out: &mut dyn Write) -> Result<()> {
        if self.fail_save {
            bail!("mock engine failed to save");
        }
        out.write_all(&self.memory)?;
        Ok(())
    }

    fn load_state(&mut self, input: &mut dyn Read) -> Result<()> {
        let mut memory = Vec::new();
        input.read_to_end(&mut memory)?;
        self.memory = memory;
        Ok(())
    }

    fn video_frame(&self) -> VideoFrame {
        VideoFrame::blank()
    }

    fn press_button(&mut self, button: JoypadButton, pressed: bool) {
        self.buttons.push((button, pressed));
    }

    fn cheat_codes(&self) -> Vec<CheatCode> {
        self.cheats.clone()
    }

    fn set_cheat_codes(&mut self, cheats: Vec<CheatCode>) {
        self.cheats = cheats;
    }

    fn feed_link_cable_byte(&mut self, byte: u8) {
        self.link_in.push(byte);
    }

    fn take_link_cable_output(&mut self) -> Option<u8> {
        self.link_out.pop_front()
    }

    fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio_enabled = enabled;
    }
}
