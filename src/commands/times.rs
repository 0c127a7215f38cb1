//! `sunswitch times [YYYY-MM-DD]`: print sunrise and sunset.
//!
//! Purely informational; nothing is applied or saved.

use anyhow::Result;
use chrono::NaiveDate;

use crate::config;
use crate::geo::location::{LocationProvider, SettingsLocationProvider};
use crate::geo::{self, Coordinate};
use crate::state::ScheduleStore;
use crate::time;

/// The settings file's coordinate, else the one in the saved state.
fn resolve_coordinate() -> Result<Coordinate> {
    let provider = SettingsLocationProvider::new(config::get_config_path()?);
    match provider.current() {
        Ok(coordinate) => Ok(coordinate),
        Err(e) => {
            log_pipe!();
            log_warning!("{e}");
            let saved = ScheduleStore::for_default_location()?.load_or_default();
            log_indented!("Using the saved location {}", saved.coordinate);
            Ok(saved.coordinate)
        }
    }
}

pub fn handle_times_command(date: Option<NaiveDate>) -> Result<()> {
    log_version!();
    let coordinate = resolve_coordinate()?;
    let now = time::source::now();

    let times = match date {
        Some(date) => geo::compute(coordinate, date),
        None => geo::compute_for_instant(coordinate, now),
    };
    geo::log_solar_times(coordinate, &times);

    if date.is_none()
        && let Some(theme) = times.implied_theme(now)
    {
        log_indented!("Right now:  {theme}");
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("times - Show sunrise and sunset");
    log_block_start!("Usage: sunswitch times [YYYY-MM-DD]");
    log_block_start!("Description:");
    log_indented!("Computes sunrise and sunset at the configured location for the");
    log_indented!("given date, or for today when no date is given.");
    log_block_start!("Examples:");
    log_indented!("sunswitch times");
    log_indented!("sunswitch times 2024-12-21");
    log_end!();
}
