//! `sunswitch get`: print the scheduler state.

use anyhow::{Context, Result};

use super::{Target, execute};
use crate::common::logger::Log;
use crate::core::gateway::ConfigView;
use crate::geo::display::format_instant;
use crate::ipc::Request;

pub fn handle_get_command(json: bool, debug_enabled: bool) -> Result<()> {
    if json {
        // Clean output for scripts: no header, no box drawing
        Log::set_enabled(false);
    }
    let (view, target) = execute(Request::GetConfig, debug_enabled)?;

    if json {
        let text = serde_json::to_string_pretty(&view).context("Failed to serialize state")?;
        println!("{text}");
        return Ok(());
    }

    log_version!();
    log_view(&view, target);
    log_end!();
    Ok(())
}

fn log_view(view: &ConfigView, target: Target) {
    log_block_start!(
        "{}",
        match target {
            Target::Daemon => "State of the running daemon",
            Target::Local => "Saved state (no daemon running)",
        }
    );
    log_indented!(
        "Automatic switching: {}",
        if view.automatic_switching { "on" } else { "off" }
    );
    log_indented!("Theme:    {}", view.last_theme);
    log_indented!("Location: {}", view.coordinate);

    match (view.date, view.sunrise, view.sunset) {
        (Some(date), Some(sunrise), Some(sunset)) => {
            log_indented!("Sunrise:  {} ({date})", format_instant(sunrise));
            log_indented!("Sunset:   {}", format_instant(sunset));
        }
        (Some(date), _, _) => {
            log_indented!("No sunrise or sunset on {date}");
        }
        _ => {}
    }

    match view.next_event {
        Some(ref next) => log_indented!(
            "Next:     {} at {}{}",
            next.target,
            format_instant(next.fire_at),
            if next.provisional { " (estimated)" } else { "" }
        ),
        None if view.automatic_switching => log_indented!("Next:     not scheduled"),
        None => {}
    }
}

pub fn display_help() {
    log_version!();
    log_block_start!("get - Show the current state");
    log_block_start!("Usage: sunswitch get [--json]");
    log_block_start!("Description:");
    log_indented!("Shows whether automatic switching is on, the last applied theme,");
    log_indented!("today's sunrise and sunset and the next scheduled switch.");
    log_indented!("Asks the running daemon, or reads the state file if none is running.");
    log_block_start!("Options:");
    log_indented!("--json  Machine-readable output");
    log_block_start!("Examples:");
    log_indented!("sunswitch get");
    log_indented!("sunswitch get --json | jq .last_theme");
    log_end!();
}
