//! `sunswitch auto <on|off>`.

use anyhow::Result;

use super::{execute, log_outcome};
use crate::ipc::Request;

pub fn handle_auto_command(enabled: bool, debug_enabled: bool) -> Result<()> {
    log_version!();
    log_block_start!(
        "Turning automatic switching {}",
        if enabled { "on" } else { "off" }
    );

    let (view, target) = execute(Request::ChangeSunsetOption { activated: enabled }, debug_enabled)?;
    log_outcome(&view, target);

    if enabled && view.coordinate == crate::geo::Coordinate::default() {
        log_pipe!();
        log_warning!("No location configured, using 0°N 0°E");
        log_indented!("Set yours with 'sunswitch geo <latitude> <longitude>'");
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("auto - Follow sunrise and sunset");
    log_block_start!("Usage: sunswitch auto <on|off>");
    log_block_start!("Description:");
    log_indented!("on:  applies the theme implied by the current time and schedules");
    log_indented!("     the next switch at sunrise or sunset");
    log_indented!("off: keeps the current theme and cancels the scheduled switch");
    log_block_start!("Examples:");
    log_indented!("sunswitch auto on");
    log_end!();
}
