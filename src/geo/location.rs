//! Location providers.
//!
//! The scheduler does not look up its own position. The daemon asks a
//! [`LocationProvider`] at startup and whenever the settings file changes;
//! a failure keeps the previous coordinate in force.

use std::fmt;
use std::path::PathBuf;

use super::solar::Coordinate;

/// The current coordinate could not be determined.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    /// No coordinate is configured
    Unavailable(String),
    /// A coordinate is configured but invalid or unreadable
    Invalid(String),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::Unavailable(reason) => write!(f, "location unavailable: {reason}"),
            LocationError::Invalid(reason) => write!(f, "invalid location: {reason}"),
        }
    }
}

impl std::error::Error for LocationError {}

/// Source of the current coordinate.
pub trait LocationProvider: Send {
    fn current(&self) -> Result<Coordinate, LocationError>;
}

/// Reads `latitude`/`longitude` from the settings file on every call.
pub struct SettingsLocationProvider {
    settings_path: PathBuf,
}

impl SettingsLocationProvider {
    pub fn new(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }
}

impl LocationProvider for SettingsLocationProvider {
    fn current(&self) -> Result<Coordinate, LocationError> {
        let settings = crate::config::load_from_path(&self.settings_path)
            .map_err(|e| LocationError::Invalid(format!("{e:#}")))?;

        match (settings.latitude, settings.longitude) {
            (Some(lat), Some(lon)) => {
                Coordinate::new(lat, lon).map_err(|e| LocationError::Invalid(e.to_string()))
            }
            _ => Err(LocationError::Unavailable(
                "latitude and longitude are not set in the settings file".to_string(),
            )),
        }
    }
}

/// Always returns the same coordinate.
pub struct StaticLocation(pub Coordinate);

impl LocationProvider for StaticLocation {
    fn current(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}
