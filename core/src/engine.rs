//! Emulation engine interface
//!
//! The Game Boy core itself lives outside this crate. The session layer only
//! talks to it through [`Engine`], which a native binding (or a test double)
//! implements. Native resources are released when the implementor is dropped.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;

pub use retrogbm_shared::CheatCode;

/// Screen width in pixels.
pub const SCREEN_WIDTH: u32 = 160;
/// Screen height in pixels.
pub const SCREEN_HEIGHT: u32 = 144;

/// Joypad buttons, numbered as the engine expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum JoypadButton {
    A = 0,
    B = 1,
    Start = 2,
    Select = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
}

/// One rendered frame, `0xAARRGGBB` per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl VideoFrame {
    pub fn blank() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            pixels: vec![0xFF00_0000; (SCREEN_WIDTH * SCREEN_HEIGHT) as usize],
        }
    }

    /// Pixels as RGBA bytes, ready for PNG encoding.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for &argb in &self.pixels {
            let [a, r, g, b] = argb.to_be_bytes();
            out.extend_from_slice(&[r, g, b, a]);
        }
        out
    }
}

/// Handle to a native emulation engine.
///
/// All methods are called from one thread at a time; the session controller
/// serialises access through a mutex.
pub trait Engine: Send + 'static {
    /// Load a cartridge. `battery_path` is where the engine keeps
    /// battery-backed RAM for this title.
    fn load_rom(&mut self, rom: &[u8], battery_path: &Path, skip_boot_rom: bool) -> Result<()>;

    /// Advance the emulation by one step.
    fn tick(&mut self);

    fn is_running(&self) -> bool;

    fn pause(&mut self);

    fn resume(&mut self);

    /// Halt the engine for good. Battery RAM is flushed by the engine.
    fn stop(&mut self);

    /// Write the engine's opaque state payload.
    fn save_state(&mut self, out: &mut dyn Write) -> Result<()>;

    /// Restore a payload previously written by [`Engine::save_state`].
    fn load_state(&mut self, input: &mut dyn Read) -> Result<()>;

    fn video_frame(&self) -> VideoFrame;

    fn press_button(&mut self, button: JoypadButton, pressed: bool);

    fn cheat_codes(&self) -> Vec<CheatCode>;

    fn set_cheat_codes(&mut self, cheats: Vec<CheatCode>);

    /// Deliver a byte received from the link-cable peer.
    fn feed_link_cable_byte(&mut self, byte: u8);

    /// Byte the emulated serial port wants to send, if any.
    ///
    /// Polled once after every tick.
    fn take_link_cable_output(&mut self) -> Option<u8> {
        None
    }

    fn set_audio_enabled(&mut self, _enabled: bool) {}
}

/// The one engine capability the link-cable transport is allowed to hold.
pub trait LinkPort: Send + Sync {
    fn feed_link_cable_byte(&self, byte: u8);
}

/// [`LinkPort`] over a shared engine.
pub(crate) struct EngineLinkPort<E: Engine> {
    engine: Arc<Mutex<E>>,
}

impl<E: Engine> EngineLinkPort<E> {
    pub(crate) fn new(engine: Arc<Mutex<E>>) -> Self {
        Self { engine }
    }
}

impl<E: Engine> LinkPort for EngineLinkPort<E> {
    fn feed_link_cable_byte(&self, byte: u8) {
        self.engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .feed_link_cable_byte(byte);
    }
}
