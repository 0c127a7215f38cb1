//! Daemon lifecycle.
//!
//! [`Sunswitch`] acquires the process-wide resources (settings, lock file,
//! signal handlers, theme applier, state store), wires them into a
//! [`CommandGateway`] and then runs three threads until shutdown:
//!
//! - the timer loop, which owns the daemon channel
//! - the IPC server
//! - the settings watcher (optional)
//!
//! ```no_run
//! use sunswitch::Sunswitch;
//!
//! # fn main() -> anyhow::Result<()> {
//! Sunswitch::new(false).run()?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use crate::common::constants::EXIT_FAILURE;
use crate::common::utils::private_path;
use crate::config::{self, Settings};
use crate::core::Scheduler;
use crate::core::gateway::CommandGateway;
use crate::core::timer::TimerLoop;
use crate::geo::location::{LocationProvider, SettingsLocationProvider};
use crate::io::lock::{self, LockFile};
use crate::io::signals::setup_signal_handler;
use crate::ipc::{self, IpcSocketServer};
use crate::state::ScheduleStore;
use crate::theme::applier::{create_applier, detect_applier};
use crate::time;

/// Builder for the long-running daemon.
pub struct Sunswitch {
    debug_enabled: bool,
    create_lock: bool,
    show_headers: bool,
    watch_settings: bool,
}

impl Sunswitch {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
            show_headers: true,
            watch_settings: true,
        }
    }

    /// Skip the single-instance lock.
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Do not hot-reload the settings file; SIGUSR2 still reloads it.
    pub fn without_watcher(mut self) -> Self {
        self.watch_settings = false;
        self
    }

    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
        }

        let settings_path = config::get_config_path()?;
        let settings = match config::load() {
            Ok(settings) => settings,
            Err(e) => {
                log_error_exit!("Settings failed");
                eprintln!("{e:?}");
                std::process::exit(EXIT_FAILURE);
            }
        };
        settings.log_settings(&settings_path);

        let _lock = if self.create_lock {
            match acquire_single_instance()? {
                Some(lock) => Some(lock),
                None => std::process::exit(EXIT_FAILURE),
            }
        } else {
            None
        };

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        let applier_type = detect_applier(&settings);
        log_block_start!("Detected applier: {}", applier_type.name());
        let applier = create_applier(applier_type, &settings, self.debug_enabled)?;

        let store = ScheduleStore::for_default_location()?;
        if self.debug_enabled {
            log_pipe!();
            log_debug!("State file: {}", private_path(store.path()));
        }

        let scheduler = Scheduler::new(store, applier, time::source::global(), self.debug_enabled);
        let gateway = CommandGateway::new(scheduler).with_wake(signal_state.sender.clone());

        let location = SettingsLocationProvider::new(settings_path.clone());
        refresh_location(&gateway, &location);

        // Retried on the next tick
        if let Err(e) = gateway.start()
            && self.debug_enabled
        {
            log_debug!("Initial state not saved: {e}");
        }

        let ipc_handle = match IpcSocketServer::new(ipc::socket_path()) {
            Ok(server) => {
                let gateway = gateway.clone();
                let running = signal_state.running.clone();
                let debug_enabled = self.debug_enabled;
                Some(
                    thread::Builder::new()
                        .name("ipc".to_string())
                        .spawn(move || {
                            if let Err(e) = server.run(gateway, running, debug_enabled) {
                                log_pipe!();
                                log_error!("IPC server stopped: {e:#}");
                            }
                        })
                        .context("Failed to spawn IPC thread")?,
                )
            }
            Err(e) => {
                log_pipe!();
                log_warning!("Control socket unavailable: {e:#}");
                log_indented!("CLI commands will edit the state file directly");
                None
            }
        };

        if self.watch_settings
            && let Err(e) = config::start_settings_watcher(
                settings_path.clone(),
                signal_state.sender.clone(),
                self.debug_enabled,
            )
        {
            log_pipe!();
            log_warning!("Settings file watching unavailable: {e:#}");
            log_indented!("Send SIGUSR2 to reload settings manually");
        }

        log_block_start!("Sunswitch is running");

        let running = signal_state.running.clone();
        let timer = TimerLoop::new(
            gateway,
            signal_state.receiver,
            signal_state.running,
            Duration::from_secs(settings.recheck_interval()),
            self.debug_enabled,
        );

        let debug_enabled = self.debug_enabled;
        let timer_handle = thread::Builder::new()
            .name("timer".to_string())
            .spawn(move || {
                timer.run(|gateway, timer| {
                    reload_settings(gateway, timer, &settings_path, &location, debug_enabled);
                });
            })
            .context("Failed to spawn timer thread")?;

        if timer_handle.join().is_err() {
            log_pipe!();
            log_critical!("Timer thread panicked");
        }
        running.store(false, Ordering::SeqCst);

        if let Some(handle) = ipc_handle
            && handle.join().is_err()
        {
            log_pipe!();
            log_error!("IPC thread panicked");
        }

        log_block_start!("Shutting down sunswitch...");
        log_end!();
        Ok(())
    }
}

/// Take the lock, or explain who holds it.
fn acquire_single_instance() -> Result<Option<LockFile>> {
    let path = lock::lock_path();
    if let Some(lock) = lock::acquire_lock(&path)? {
        log_block_start!("Lock acquired, starting sunswitch...");
        return Ok(Some(lock));
    }

    log_pipe!();
    match lock::running_instance(&path) {
        Some(pid) => log_error!("sunswitch is already running (PID: {pid})"),
        None => log_error!("sunswitch lock {} is held", private_path(&path)),
    }
    log_indented!("Use 'sunswitch stop' to stop it, or control it with");
    log_indented!("'sunswitch theme', 'sunswitch auto' and 'sunswitch geo'");
    log_end!();
    Ok(None)
}

/// Feed the provider's coordinate to the scheduler, keeping the old one on failure.
fn refresh_location(gateway: &CommandGateway, provider: &dyn LocationProvider) {
    match provider.current() {
        Ok(coordinate) => {
            if let Err(e) = gateway.change_location(coordinate) {
                log_debug!("Location change not saved yet: {e}");
            }
        }
        Err(e) => {
            log_pipe!();
            log_warning!("{e}");
            log_indented!("Keeping {}", gateway.get_config().coordinate);
        }
    }
}

/// Re-read the settings file and push the changes into the running daemon.
fn reload_settings(
    gateway: &CommandGateway,
    timer: &mut TimerLoop,
    settings_path: &Path,
    location: &dyn LocationProvider,
    debug_enabled: bool,
) {
    let settings: Settings = match config::load_from_path(settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            log_pipe!();
            log_warning!("Settings reload failed: {e:#}");
            log_indented!("Keeping the previous settings");
            return;
        }
    };

    log_block_start!("Settings reloaded");
    timer.set_recheck_interval(Duration::from_secs(settings.recheck_interval()));

    match create_applier(detect_applier(&settings), &settings, debug_enabled) {
        Ok(applier) => gateway.set_applier(applier),
        Err(e) => {
            log_pipe!();
            log_warning!("Keeping the previous applier: {e:#}");
        }
    }

    refresh_location(gateway, location);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::geo::location::StaticLocation;
    use crate::geo::Coordinate;
    use crate::theme::applier::NoopApplier;
    use crate::time::source::{ManualTimeSource, parse_utc_datetime};

    fn gateway(dir: &tempfile::TempDir) -> CommandGateway {
        let clock = Arc::new(ManualTimeSource::new(
            parse_utc_datetime("2024-06-21 12:00:00").unwrap(),
        ));
        CommandGateway::new(Scheduler::new(
            ScheduleStore::new(dir.path().join("state.json")),
            Box::new(NoopApplier),
            clock,
            false,
        ))
    }

    #[test]
    fn test_refresh_location_sets_coordinate() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(&dir);
        let london = Coordinate::new(51.5, -0.12).unwrap();

        refresh_location(&gateway, &StaticLocation(london));
        assert_eq!(gateway.get_config().coordinate, london);
    }

    #[test]
    fn test_refresh_location_failure_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(&dir);
        let london = Coordinate::new(51.5, -0.12).unwrap();
        gateway.change_location(london).unwrap();

        let missing = SettingsLocationProvider::new(dir.path().join("missing.toml"));
        refresh_location(&gateway, &missing);
        assert_eq!(gateway.get_config().coordinate, london);
    }

    #[test]
    fn test_reload_applies_new_settings() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(&dir);
        let path = dir.path().join("sunswitch.toml");
        std::fs::write(
            &path,
            "applier = \"none\"\nlatitude = 40.0\nlongitude = -74.0\nrecheck_interval = 60\n",
        )
        .unwrap();

        let (_sender, receiver) = std::sync::mpsc::channel();
        let mut timer = TimerLoop::new(
            gateway.clone(),
            receiver,
            Arc::new(std::sync::atomic::AtomicBool::new(true)),
            Duration::from_secs(300),
            false,
        );
        let provider = SettingsLocationProvider::new(path.clone());

        reload_settings(&gateway, &mut timer, &path, &provider, false);
        assert_eq!(
            gateway.get_config().coordinate,
            Coordinate::new(40.0, -74.0).unwrap()
        );
    }
}
