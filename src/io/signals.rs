//! Unix signal handling.
//!
//! Signals are turned into [`DaemonMessage`]s on the same channel the IPC
//! server and the settings watcher use, so the timer loop has a single place
//! to wait on.
//!
//! - SIGINT, SIGTERM, SIGHUP: shut down
//! - SIGUSR2: reload settings and re-evaluate the schedule

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// Everything that can wake the timer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonMessage {
    /// The pending event may have changed; recompute the wait
    Wake,
    /// Run a re-evaluation now
    Reevaluate,
    /// The settings file changed on disk
    SettingsChanged,
    Shutdown,
}

/// Channel and running flag shared between the daemon's threads.
pub struct SignalState {
    pub running: Arc<AtomicBool>,
    pub receiver: Receiver<DaemonMessage>,
    pub sender: Sender<DaemonMessage>,
}

impl SignalState {
    /// A channel with no OS signal handlers attached.
    pub fn new() -> Self {
        let (sender, receiver) = std::sync::mpsc::channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            receiver,
            sender,
        }
    }
}

impl Default for SignalState {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a raw signal number to the messages it produces.
fn messages_for(signal: i32) -> &'static [DaemonMessage] {
    match signal {
        SIGUSR2 => &[DaemonMessage::SettingsChanged, DaemonMessage::Reevaluate],
        SIGINT | SIGTERM | SIGHUP => &[DaemonMessage::Shutdown],
        _ => &[],
    }
}

/// Install handlers and spawn the thread that forwards signals as messages.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::new();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running = state.running.clone();
    let sender = state.sender.clone();

    thread::spawn(move || {
        for signal in signals.forever() {
            let messages = messages_for(signal);

            if messages.contains(&DaemonMessage::Shutdown) {
                log_pipe!();
                log_info!("Received shutdown signal");
                running.store(false, Ordering::SeqCst);
            } else if debug_enabled {
                log_pipe!();
                log_debug!("Received SIGUSR2, reloading");
            }

            for message in messages {
                if sender.send(*message).is_err() {
                    return;
                }
            }
        }
    });

    Ok(state)
}
