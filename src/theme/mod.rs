//! Theme values and the capability that applies them to the host.
//!
//! The scheduler only ever talks to a [`ThemeApplier`]; how the appearance is
//! actually switched (AppleScript, gsettings, a user command) lives in [`applier`].

pub mod applier;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use applier::{ApplierType, create_applier, detect_applier};

/// Display appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }

    pub fn opposite(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme '{other}' (expected 'light' or 'dark')")),
        }
    }
}

/// Applying a theme to the host failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyError {
    /// Name of the applier that failed
    pub applier: &'static str,
    pub theme: Theme,
    pub reason: String,
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} applier could not switch to {}: {}",
            self.applier, self.theme, self.reason
        )
    }
}

impl std::error::Error for ApplyError {}

/// Capability that switches the host's appearance.
///
/// Implementations must tolerate being asked for the theme that is already
/// active; the scheduler applies at least once and never suppresses repeats.
pub trait ThemeApplier: Send {
    fn apply(&mut self, theme: Theme) -> Result<(), ApplyError>;

    /// Human-readable name used in logs.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_parsing_is_case_insensitive() {
        assert_eq!("Light".parse::<Theme>(), Ok(Theme::Light));
        assert_eq!("DARK".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!(" dark ".parse::<Theme>(), Ok(Theme::Dark));
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn test_theme_serializes_as_variant_name() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"Dark\"");
        let theme: Theme = serde_json::from_str("\"Light\"").unwrap();
        assert_eq!(theme, Theme::Light);
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Theme::Light.opposite(), Theme::Dark);
        assert_eq!(Theme::Dark.opposite(), Theme::Light);
    }
}
