//! Emulation session lifecycle
//!
//! [`SessionController`] owns an [`Engine`](crate::engine::Engine) and
//! everything persisted around it:
//!
//! - save-state slots with the 64-byte header (quick save rotation,
//!   manual slots, the autosave written at checkpoints)
//! - play time and cheats in `profile.json`
//! - the execution thread ticking the engine
//!
//! Host lifecycle events map to [`SessionController::on_suspend`],
//! [`SessionController::on_resume`] and [`SessionController::on_terminate`].

mod controller;
mod error;
mod runner;
mod types;

#[cfg(test)]
mod tests;

pub use controller::SessionController;
pub use error::SessionError;
pub use types::{CheckpointReport, Session, SessionState};
