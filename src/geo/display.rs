//! Formatting of solar times for logs and the `times` command.

use chrono::{DateTime, Local, Utc};

use super::solar::{Coordinate, SolarTimes};

/// `HH:MM UTC (HH:MM local)`, or just the UTC part when both agree.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    let utc = instant.format("%H:%M").to_string();
    let local = instant.with_timezone(&Local).format("%H:%M").to_string();
    if utc == local {
        format!("{utc} UTC")
    } else {
        format!("{utc} UTC ({local} local)")
    }
}

/// Day length as `Hh MMm`.
pub fn format_day_length(times: &SolarTimes) -> String {
    let minutes = (times.sunset - times.sunrise).num_minutes();
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

/// Log one day's solar times as an indented block.
pub fn log_solar_times(coordinate: Coordinate, times: &SolarTimes) {
    log_block_start!("Solar times for {} on {}", coordinate, times.date);
    if times.is_polar() {
        log_indented!("The sun does not rise or set on this date (polar day or night)");
        log_indented!("Automatic switching keeps the last applied theme");
        return;
    }
    log_indented!("Sunrise:    {}", format_instant(times.sunrise));
    log_indented!("Sunset:     {}", format_instant(times.sunset));
    log_indented!("Day length: {}", format_day_length(times));
}
