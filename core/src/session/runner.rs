//! Engine execution thread

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::engine::Engine;

/// Flags shared between the controller and the execution thread.
pub(crate) struct LoopControl {
    running: AtomicBool,
    paused: Mutex<bool>,
    wake: Condvar,
    link_output: Mutex<Option<SyncSender<u8>>>,
}

impl LoopControl {
    pub(crate) fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            paused: Mutex::new(false),
            wake: Condvar::new(),
            link_output: Mutex::new(None),
        }
    }

    fn paused(&self) -> MutexGuard<'_, bool> {
        self.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn arm(&self) {
        *self.paused() = false;
        self.running.store(true, Ordering::Release);
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        *self.paused() = paused;
        self.wake.notify_all();
    }

    /// Ask the loop to exit, waking it if paused.
    pub(crate) fn halt(&self) {
        self.running.store(false, Ordering::Release);
        let mut paused = self.paused();
        *paused = false;
        drop(paused);
        self.wake.notify_all();
    }

    /// Block while paused. Returns whether the loop should keep going.
    fn wait_while_paused(&self) -> bool {
        let mut paused = self.paused();
        while *paused && self.is_running() {
            paused = self
                .wake
                .wait(paused)
                .unwrap_or_else(PoisonError::into_inner);
        }
        self.is_running()
    }

    pub(crate) fn set_link_output(&self, tx: SyncSender<u8>) {
        *self
            .link_output
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(tx);
    }

    fn publish(&self, byte: u8) {
        let mut output = self
            .link_output
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = output.as_ref() else {
            return;
        };
        match tx.try_send(byte) {
            Ok(()) => {}
            Err(TrySendError::Full(byte)) => {
                tracing::trace!(byte, "Link output full, dropping byte");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("Link output subscriber went away");
                *output = None;
            }
        }
    }
}

/// Spawn the thread that ticks the engine until halted.
pub(crate) fn spawn<E: Engine>(
    engine: Arc<Mutex<E>>,
    control: Arc<LoopControl>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("retrogbm-engine".to_string())
        .spawn(move || run(&engine, &control))
}

fn run<E: Engine>(engine: &Mutex<E>, control: &LoopControl) {
    tracing::debug!("Execution loop started");
    let mut ticks: u64 = 0;

    while control.wait_while_paused() {
        let output = {
            let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
            if !engine.is_running() {
                tracing::info!("Engine reported it is no longer running");
                break;
            }
            engine.tick();
            engine.take_link_cable_output()
        };
        ticks += 1;

        if let Some(byte) = output {
            control.publish(byte);
        }

        // Give the controller a chance at the engine lock between ticks.
        thread::yield_now();
    }

    tracing::debug!(ticks, "Execution loop exited");
}
