//! Settings validation.
//!
//! Rejects values the daemon cannot work with and says which key to fix.

use anyhow::Result;

use super::{ApplierKind, Settings};
use crate::common::constants::{MAXIMUM_RECHECK_INTERVAL, MINIMUM_RECHECK_INTERVAL};

pub fn validate_settings(settings: &Settings) -> Result<()> {
    if let Some(lat) = settings.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {lat})");
    }

    if let Some(lon) = settings.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!("longitude must be between -180 and 180 degrees (got {lon})");
    }

    // One without the other is almost certainly a typo
    if settings.latitude.is_some() != settings.longitude.is_some() {
        anyhow::bail!("latitude and longitude must be set together");
    }

    if let Some(interval) = settings.recheck_interval
        && !(MINIMUM_RECHECK_INTERVAL..=MAXIMUM_RECHECK_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "recheck_interval ({interval} seconds) must be between {MINIMUM_RECHECK_INTERVAL} and {MAXIMUM_RECHECK_INTERVAL} seconds"
        );
    }

    for (key, command) in [
        ("light_command", &settings.light_command),
        ("dark_command", &settings.dark_command),
    ] {
        if let Some(command) = command
            && command.trim().is_empty()
        {
            anyhow::bail!("{key} must not be empty");
        }
    }

    if settings.applier == Some(ApplierKind::Command)
        && (settings.light_command.is_none() || settings.dark_command.is_none())
    {
        anyhow::bail!("applier = \"command\" requires both light_command and dark_command");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_coordinate_ranges() {
        let settings = Settings {
            latitude: Some(91.0),
            longitude: Some(0.0),
            ..Settings::default()
        };
        assert!(validate_settings(&settings).is_err());

        let settings = Settings {
            latitude: Some(0.0),
            longitude: Some(180.5),
            ..Settings::default()
        };
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_half_a_coordinate_is_rejected() {
        let settings = Settings {
            latitude: Some(51.5),
            ..Settings::default()
        };
        let error = validate_settings(&settings).unwrap_err();
        assert!(error.to_string().contains("together"));
    }

    #[test]
    fn test_recheck_interval_bounds() {
        for (interval, ok) in [(29, false), (30, true), (3600, true), (3601, false)] {
            let settings = Settings {
                recheck_interval: Some(interval),
                ..Settings::default()
            };
            assert_eq!(validate_settings(&settings).is_ok(), ok, "interval {interval}");
        }
    }

    #[test]
    fn test_command_applier_needs_both_commands() {
        let settings = Settings {
            applier: Some(ApplierKind::Command),
            dark_command: Some("true".to_string()),
            ..Settings::default()
        };
        assert!(validate_settings(&settings).is_err());

        let settings = Settings {
            applier: Some(ApplierKind::Command),
            light_command: Some("  ".to_string()),
            dark_command: Some("true".to_string()),
            ..Settings::default()
        };
        assert!(validate_settings(&settings).is_err());
    }
}
