//! User settings for sunswitch.
//!
//! Settings live in `sunswitch.toml` under `$XDG_CONFIG_HOME/sunswitch/` (or the
//! directory given with `--config`). They describe the host, not the schedule:
//! which applier switches the theme, where the user is, and how often the daemon
//! re-checks itself. The schedule record (automatic switching on/off, last
//! theme) is owned by the scheduler and persisted separately in the state
//! directory.
//!
//! ```toml
//! #[Theme applier]
//! applier = "auto"           # "auto", "macos", "gnome", "command" or "none"
//! light_command = "..."      # Shell command run for Light (applier = "command")
//! dark_command = "..."       # Shell command run for Dark (applier = "command")
//!
//! #[Scheduling]
//! recheck_interval = 300     # Seconds between self-checks (30-3600)
//!
//! #[Location]
//! latitude = 51.500000       # Geographic latitude
//! longitude = -0.120000      # Geographic longitude (use 'sunswitch geo' to change)
//! ```
//!
//! Missing keys fall back to defaults; out-of-range values are rejected by
//! [`validation::validate_settings`] with a message naming the offending key.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use serde::Deserialize;
use std::path::Path;

use crate::common::constants::DEFAULT_RECHECK_INTERVAL;
use crate::common::utils::private_path;

pub use builder::{create_default_settings, update_coordinates};
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_settings_watcher;

/// Which mechanism switches the host appearance.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplierKind {
    /// Pick based on the platform and desktop environment
    Auto,
    #[serde(rename = "macos")]
    MacOs,
    Gnome,
    /// Run `light_command` / `dark_command`
    Command,
    /// Log only
    None,
}

impl ApplierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplierKind::Auto => "auto",
            ApplierKind::MacOs => "macos",
            ApplierKind::Gnome => "gnome",
            ApplierKind::Command => "command",
            ApplierKind::None => "none",
        }
    }
}

/// Parsed `sunswitch.toml`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Settings {
    pub applier: Option<ApplierKind>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub light_command: Option<String>,
    pub dark_command: Option<String>,
    /// Seconds between periodic re-evaluations
    pub recheck_interval: Option<u64>,
}

impl Settings {
    pub fn recheck_interval(&self) -> u64 {
        self.recheck_interval.unwrap_or(DEFAULT_RECHECK_INTERVAL)
    }

    /// Log the effective settings in the block style used at startup.
    pub fn log_settings(&self, path: &Path) {
        log_block_start!("Loaded settings from {}", private_path(path));
        log_indented!(
            "Applier: {}",
            self.applier.unwrap_or(ApplierKind::Auto).as_str()
        );
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => log_indented!("Location: {lat:.4}, {lon:.4}"),
            _ => log_indented!("Location: not configured"),
        }
        if let Some(ref light) = self.light_command {
            log_indented!("Light command: {light}");
        }
        if let Some(ref dark) = self.dark_command {
            log_indented!("Dark command: {dark}");
        }
        log_indented!("Recheck interval: {}s", self.recheck_interval());
    }
}

#[cfg(test)]
mod tests;
