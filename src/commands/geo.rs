//! `sunswitch geo <latitude> <longitude>`: store a new location.
//!
//! The coordinate is written to the settings file (which is where the daemon
//! reads its location from) and then pushed to the daemon directly, so the
//! change takes effect even when file watching is unavailable.

use anyhow::{Context, Result};

use super::{execute, log_outcome};
use crate::common::utils::private_path;
use crate::config;
use crate::geo::{self, Coordinate};
use crate::ipc::Request;
use crate::time;

pub fn handle_geo_command(latitude: f64, longitude: f64, debug_enabled: bool) -> Result<()> {
    log_version!();

    let coordinate = match Coordinate::new(latitude, longitude) {
        Ok(coordinate) => coordinate,
        Err(e) => {
            log_error_exit!("{e}");
            std::process::exit(crate::common::constants::EXIT_FAILURE);
        }
    };

    // Creates the default file on first use
    config::load().context("Settings must be valid before the location can be updated")?;
    config::update_coordinates(latitude, longitude)?;
    log_block_start!(
        "Saved {coordinate} to {}",
        private_path(&config::get_config_path()?)
    );

    let (view, target) = execute(
        Request::ChangeLocation {
            latitude,
            longitude,
        },
        debug_enabled,
    )?;

    geo::log_solar_times(coordinate, &geo::compute_for_instant(coordinate, time::source::now()));
    log_outcome(&view, target);
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("geo - Set your location");
    log_block_start!("Usage: sunswitch geo <latitude> <longitude>");
    log_block_start!("Arguments:");
    log_indented!("latitude   Decimal degrees, -90 to 90 (south is negative)");
    log_indented!("longitude  Decimal degrees, -180 to 180 (west is negative)");
    log_block_start!("Description:");
    log_indented!("Writes the coordinate to sunswitch.toml and reschedules the next");
    log_indented!("switch. Comments in the settings file are preserved.");
    log_block_start!("Examples:");
    log_indented!("sunswitch geo 51.5074 -0.1278   # London");
    log_indented!("sunswitch geo -33.8688 151.2093 # Sydney");
    log_end!();
}
