//! Default settings generation and in-place coordinate updates.
//!
//! The default file is written with aligned trailing comments so it doubles as
//! documentation. `sunswitch geo` edits the latitude/longitude lines in place,
//! leaving every other line and the comment column untouched.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;

use super::get_config_path;
use crate::common::constants::{
    DEFAULT_RECHECK_INTERVAL, MAXIMUM_RECHECK_INTERVAL, MINIMUM_RECHECK_INTERVAL,
};
use crate::common::utils::private_path;

/// Write a commented default `sunswitch.toml` to `path`.
pub fn create_default_settings(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let content = SettingsBuilder::new()
        .add_section("Theme applier")
        .add_setting(
            "applier",
            "\"auto\"",
            "\"auto\", \"macos\", \"gnome\", \"command\" or \"none\"",
        )
        .add_example(
            "light_command",
            "\"gsettings set org.gnome.desktop.interface gtk-theme Adwaita\"",
            "Shell command run for Light (applier = \"command\")",
        )
        .add_example(
            "dark_command",
            "\"gsettings set org.gnome.desktop.interface gtk-theme Adwaita-dark\"",
            "Shell command run for Dark (applier = \"command\")",
        )
        .add_section("Scheduling")
        .add_setting(
            "recheck_interval",
            &DEFAULT_RECHECK_INTERVAL.to_string(),
            &format!(
                "Seconds between self-checks ({MINIMUM_RECHECK_INTERVAL}-{MAXIMUM_RECHECK_INTERVAL})"
            ),
        )
        .add_section("Location")
        .add_example("latitude", "51.500000", "Geographic latitude")
        .add_example(
            "longitude",
            "-0.120000",
            "Geographic longitude (use 'sunswitch geo' to change)",
        )
        .build();

    fs::write(path, format!("{content}\n"))
        .with_context(|| format!("Failed to write default settings to {}", private_path(path)))
}

/// Replace the coordinate in the active settings file.
pub fn update_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    let config_path = get_config_path()?;
    update_coordinates_at(&config_path, latitude, longitude)?;

    log_block_start!("Updated coordinates in {}", private_path(&config_path));
    log_indented!("Latitude: {latitude:.6}");
    log_indented!("Longitude: {longitude:.6}");
    Ok(())
}

/// Replace the coordinate in the settings file at `path`.
pub fn update_coordinates_at(path: &Path, latitude: f64, longitude: f64) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("No settings file found at {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", private_path(path)))?;

    let updated = rewrite_coordinates(&content, latitude, longitude);

    fs::write(path, updated)
        .with_context(|| format!("Failed to write settings to {}", private_path(path)))
}

/// Rewrite (or add) the `latitude`/`longitude` lines of a settings document.
pub(crate) fn rewrite_coordinates(content: &str, latitude: f64, longitude: f64) -> String {
    let mut updated = content.to_string();
    let mut missing = Vec::new();

    for (key, value) in [
        ("latitude", format!("{latitude:.6}")),
        ("longitude", format!("{longitude:.6}")),
    ] {
        match rewrite_setting(&updated, key, &value) {
            Some(rewritten) => updated = rewritten,
            None => missing.push(format!("{key} = {value}")),
        }
    }

    if !missing.is_empty() {
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        if !updated.contains("#[Location]") {
            updated.push_str("\n#[Location]\n");
        }
        for line in missing {
            updated.push_str(&line);
            updated.push('\n');
        }
    }

    updated
}

/// Set `key` to `value` on its first active line, or failing that on its
/// first commented-out line. Returns `None` when the key does not appear.
fn rewrite_setting(content: &str, key: &str, value: &str) -> Option<String> {
    let active = format!(
        r"(?m)^(?P<indent>[ \t]*){key}(?P<assign>[ \t]*=[ \t]*)(?P<value>[^#\r\n]*?)(?P<gap>[ \t]*)(?P<comment>#[^\r\n]*)?$"
    );
    let commented = format!(
        r"(?m)^(?P<indent>[ \t]*)#[ \t]*{key}(?P<assign>[ \t]*=[ \t]*)(?P<value>[^#\r\n]*?)(?P<gap>[ \t]*)(?P<comment>#[^\r\n]*)?$"
    );

    for pattern in [active, commented] {
        let Ok(regex) = Regex::new(&pattern) else {
            continue;
        };
        if !regex.is_match(content) {
            continue;
        }

        let rewritten = regex.replacen(content, 1, |caps: &Captures| {
            let indent = &caps["indent"];
            let assign = &caps["assign"];
            match caps.name("comment") {
                Some(comment) => {
                    // Keep the comment in its original column when the value fits
                    let old_width = caps["value"].len() + caps["gap"].len();
                    let padding = old_width.saturating_sub(value.len()).max(1);
                    format!(
                        "{indent}{key}{assign}{value}{}{}",
                        " ".repeat(padding),
                        comment.as_str()
                    )
                }
                None => format!("{indent}{key}{assign}{value}"),
            }
        });
        return Some(rewritten.into_owned());
    }

    None
}

/// Builds a settings document with section headers and aligned comments.
struct SettingsBuilder {
    entries: Vec<Entry>,
}

enum Entry {
    Section(String),
    Setting { line: String, comment: String },
}

impl SettingsBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(Entry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A setting that is written commented out.
    fn add_example(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("#{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Setting { line, .. } => Some(line.len()),
                Entry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::new();
        for entry in self.entries {
            match entry {
                Entry::Section(header) => {
                    if !lines.is_empty() {
                        lines.push(String::new());
                    }
                    lines.push(header);
                }
                Entry::Setting { line, comment } => {
                    let padding = " ".repeat(width - line.len());
                    lines.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        lines.join("\n")
    }
}
