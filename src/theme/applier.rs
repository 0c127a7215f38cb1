//! Concrete theme appliers and applier selection.
//!
//! ## Supported Appliers
//!
//! - **macOS**: `osascript` toggling `appearancePreferences.darkMode` in System Events
//! - **GNOME**: `gsettings` writing `org.gnome.desktop.interface color-scheme`
//! - **Command**: user-provided shell commands (`light_command`/`dark_command`)
//! - **None**: logs the switch only (dry runs, unsupported desktops)
//!
//! With `applier = "auto"`, macOS maps to its native applier; elsewhere
//! configured commands win, then GNOME when a GNOME-like desktop is detected,
//! then `None`.
//!
//! Every command gets [`APPLY_TIMEOUT_MS`] to finish and is killed after that,
//! so a hung command (or an `osascript` waiting on a permission prompt) cannot
//! stall the scheduler.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::{ApplyError, Theme, ThemeApplier};
use crate::common::constants::APPLY_TIMEOUT_MS;
use crate::config::{ApplierKind, Settings};

/// Resolved applier choice after auto-detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplierType {
    MacOs,
    Gnome,
    Command,
    None,
}

impl ApplierType {
    pub fn name(&self) -> &'static str {
        match self {
            ApplierType::MacOs => "macOS",
            ApplierType::Gnome => "GNOME",
            ApplierType::Command => "Command",
            ApplierType::None => "None",
        }
    }
}

/// Resolve the configured applier, auto-detecting when asked to.
pub fn detect_applier(settings: &Settings) -> ApplierType {
    match settings.applier.unwrap_or(ApplierKind::Auto) {
        ApplierKind::MacOs => ApplierType::MacOs,
        ApplierKind::Gnome => ApplierType::Gnome,
        ApplierKind::Command => ApplierType::Command,
        ApplierKind::None => ApplierType::None,
        ApplierKind::Auto => {
            if cfg!(target_os = "macos") {
                ApplierType::MacOs
            } else if settings.light_command.is_some() && settings.dark_command.is_some() {
                ApplierType::Command
            } else if is_gnome_like_desktop() {
                ApplierType::Gnome
            } else {
                ApplierType::None
            }
        }
    }
}

fn is_gnome_like_desktop() -> bool {
    std::env::var("XDG_CURRENT_DESKTOP")
        .map(|desktop| {
            desktop
                .split(':')
                .any(|d| matches!(d.to_ascii_lowercase().as_str(), "gnome" | "unity" | "budgie" | "pop"))
        })
        .unwrap_or(false)
}

/// Build the applier for a resolved type.
pub fn create_applier(
    applier_type: ApplierType,
    settings: &Settings,
    debug_enabled: bool,
) -> anyhow::Result<Box<dyn ThemeApplier>> {
    let applier: Box<dyn ThemeApplier> = match applier_type {
        ApplierType::MacOs => Box::new(MacOsApplier { debug_enabled }),
        ApplierType::Gnome => Box::new(GnomeApplier { debug_enabled }),
        ApplierType::Command => {
            let (Some(light), Some(dark)) = (&settings.light_command, &settings.dark_command)
            else {
                anyhow::bail!("applier = \"command\" requires both light_command and dark_command");
            };
            Box::new(CommandApplier::new(light.clone(), dark.clone(), debug_enabled))
        }
        ApplierType::None => Box::new(NoopApplier),
    };
    Ok(applier)
}

/// Run a command, waiting at most `timeout` for it to exit.
///
/// A command still running at the deadline is killed and reported as failed.
fn run_command(mut command: Command, timeout: Duration, debug_enabled: bool) -> Result<(), String> {
    if debug_enabled {
        log_debug!("Running {command:?}");
    }
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to spawn: {e}"))?;

    let start = Instant::now();
    let mut delay = Duration::from_millis(5);
    let max_delay = Duration::from_millis(100);

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!("timed out after {}ms", timeout.as_millis()));
            }
            Ok(None) => {
                thread::sleep(delay);
                delay = std::cmp::min(delay * 2, max_delay);
            }
            Err(e) => return Err(format!("failed to wait: {e}")),
        }
    };

    if status.success() {
        return Ok(());
    }
    let mut stderr = String::new();
    if let Some(mut pipe) = child.stderr.take() {
        let _ = pipe.read_to_string(&mut stderr);
    }
    Err(format!("{status} ({})", stderr.trim()))
}

fn default_timeout() -> Duration {
    Duration::from_millis(APPLY_TIMEOUT_MS)
}

/// macOS System Events appearance toggle.
pub struct MacOsApplier {
    debug_enabled: bool,
}

impl ThemeApplier for MacOsApplier {
    fn apply(&mut self, theme: Theme) -> Result<(), ApplyError> {
        let dark = theme == Theme::Dark;
        let script =
            format!("Application('System Events').appearancePreferences.darkMode = {dark}");
        let mut command = Command::new("osascript");
        command.args(["-l", "JavaScript", "-e", &script]);

        run_command(command, default_timeout(), self.debug_enabled).map_err(|reason| ApplyError {
            applier: self.name(),
            theme,
            reason,
        })
    }

    fn name(&self) -> &'static str {
        "macOS"
    }
}

/// GNOME (and derivatives) color-scheme preference.
pub struct GnomeApplier {
    debug_enabled: bool,
}

impl ThemeApplier for GnomeApplier {
    fn apply(&mut self, theme: Theme) -> Result<(), ApplyError> {
        let scheme = match theme {
            Theme::Light => "default",
            Theme::Dark => "prefer-dark",
        };
        let mut command = Command::new("gsettings");
        command.args(["set", "org.gnome.desktop.interface", "color-scheme", scheme]);

        run_command(command, default_timeout(), self.debug_enabled).map_err(|reason| ApplyError {
            applier: self.name(),
            theme,
            reason,
        })
    }

    fn name(&self) -> &'static str {
        "GNOME"
    }
}

/// User-provided shell commands.
pub struct CommandApplier {
    light_command: String,
    dark_command: String,
    timeout: Duration,
    debug_enabled: bool,
}

impl CommandApplier {
    pub fn new(light_command: String, dark_command: String, debug_enabled: bool) -> Self {
        Self {
            light_command,
            dark_command,
            timeout: default_timeout(),
            debug_enabled,
        }
    }

    /// Override the per-command deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ThemeApplier for CommandApplier {
    fn apply(&mut self, theme: Theme) -> Result<(), ApplyError> {
        let script = match theme {
            Theme::Light => &self.light_command,
            Theme::Dark => &self.dark_command,
        };
        let mut command = Command::new("sh");
        command.args(["-c", script]);

        run_command(command, self.timeout, self.debug_enabled).map_err(|reason| ApplyError {
            applier: self.name(),
            theme,
            reason,
        })
    }

    fn name(&self) -> &'static str {
        "Command"
    }
}

/// Logs the requested theme without touching the host.
pub struct NoopApplier;

impl ThemeApplier for NoopApplier {
    fn apply(&mut self, theme: Theme) -> Result<(), ApplyError> {
        log_decorated!("Theme would switch to {theme} (no applier configured)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "None"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(kind: ApplierKind) -> Settings {
        Settings {
            applier: Some(kind),
            ..Settings::default()
        }
    }

    #[test]
    fn test_explicit_applier_is_respected() {
        assert_eq!(detect_applier(&settings_with(ApplierKind::Gnome)), ApplierType::Gnome);
        assert_eq!(detect_applier(&settings_with(ApplierKind::None)), ApplierType::None);
        assert_eq!(detect_applier(&settings_with(ApplierKind::MacOs)), ApplierType::MacOs);
    }

    #[test]
    fn test_command_applier_requires_both_commands() {
        let settings = Settings {
            applier: Some(ApplierKind::Command),
            light_command: Some("true".to_string()),
            ..Settings::default()
        };
        assert!(create_applier(ApplierType::Command, &settings, false).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_applier_runs_the_matching_command() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("theme");
        let settings = Settings {
            applier: Some(ApplierKind::Command),
            light_command: Some(format!("echo light > {}", marker.display())),
            dark_command: Some(format!("echo dark > {}", marker.display())),
            ..Settings::default()
        };

        let mut applier = create_applier(ApplierType::Command, &settings, false).unwrap();
        applier.apply(Theme::Dark).unwrap();
        assert_eq!(std::fs::read_to_string(&marker).unwrap().trim(), "dark");
        applier.apply(Theme::Light).unwrap();
        assert_eq!(std::fs::read_to_string(&marker).unwrap().trim(), "light");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_failure_becomes_apply_error() {
        let settings = Settings {
            applier: Some(ApplierKind::Command),
            light_command: Some("exit 3".to_string()),
            dark_command: Some("exit 3".to_string()),
            ..Settings::default()
        };

        let mut applier = create_applier(ApplierType::Command, &settings, false).unwrap();
        let error = applier.apply(Theme::Light).unwrap_err();
        assert_eq!(error.applier, "Command");
        assert_eq!(error.theme, Theme::Light);
    }

    #[cfg(unix)]
    #[test]
    fn test_hung_command_is_killed_at_the_deadline() {
        let mut applier = CommandApplier::new("sleep 30".to_string(), "sleep 30".to_string(), false)
            .with_timeout(Duration::from_millis(200));

        let start = Instant::now();
        let error = applier.apply(Theme::Dark).unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(error.reason.contains("timed out"), "{}", error.reason);
        assert_eq!(error.theme, Theme::Dark);
    }
}
