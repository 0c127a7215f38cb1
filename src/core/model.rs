//! The scheduler's record and its pending wake-up.

use chrono::{DateTime, Utc};

use crate::geo::{Coordinate, SolarTimes};
use crate::theme::Theme;

/// Everything the scheduler remembers across restarts.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub automatic_switching: bool,
    pub coordinate: Coordinate,
    /// Theme most recently requested, whether or not the applier succeeded
    pub last_theme: Theme,
    pub last_solar_times: Option<SolarTimes>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            automatic_switching: false,
            coordinate: Coordinate::default(),
            last_theme: Theme::Light,
            last_solar_times: None,
        }
    }
}

/// A single armed boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    pub fire_at: DateTime<Utc>,
    pub target: Theme,
    /// Identifies the arming; fires carrying an older generation are ignored
    pub generation: u64,
    /// Estimated from the previous day; refined when it fires
    pub provisional: bool,
}
