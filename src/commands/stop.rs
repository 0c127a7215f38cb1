//! `sunswitch stop`: terminate the running daemon with SIGTERM.

use anyhow::Result;
use std::thread;
use std::time::Duration;

use crate::common::constants::EXIT_FAILURE;
use crate::common::utils::{is_process_running, terminate_process};
use crate::io::lock;

/// How long to wait for the daemon to exit, in 100 ms steps
const STOP_ATTEMPTS: u32 = 30;

pub fn handle_stop_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let Some(pid) = lock::running_instance(&lock::lock_path()) else {
        log_error_exit!("sunswitch isn't running");
        std::process::exit(EXIT_FAILURE);
    };

    log_block_start!("Stopping sunswitch (PID: {pid})...");
    if !terminate_process(pid) {
        log_error_exit!("Failed to send SIGTERM to process {pid}");
        std::process::exit(EXIT_FAILURE);
    }
    if debug_enabled {
        log_pipe!();
        log_debug!("SIGTERM sent to process {pid}");
    }

    for _ in 0..STOP_ATTEMPTS {
        if !is_process_running(pid) {
            log_pipe!();
            log_info!("Process terminated successfully");
            log_end!();
            return Ok(());
        }
        thread::sleep(Duration::from_millis(100));
    }

    log_pipe!();
    log_warning!("Process did not terminate within the expected time");
    log_indented!("The termination signal was sent, but the process may still be shutting down");
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("stop - Terminate the running daemon");
    log_block_start!("Usage: sunswitch stop");
    log_block_start!("Description:");
    log_indented!("Sends SIGTERM to the daemon holding the lock and waits up to");
    log_indented!("3 seconds for it to exit. The saved state is kept.");
    log_end!();
}
