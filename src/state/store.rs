//! Loading and saving the scheduler record.
//!
//! The record is a small JSON document. Only the date of the last solar
//! computation is stored; the instants are recomputed from it on load so a
//! stale or hand-edited file can never carry inconsistent times.
//!
//! Writes go through a temporary file in the same directory followed by a
//! rename, so a crash mid-write leaves the previous record intact.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::common::constants::STATE_FILE_NAME;
use crate::common::utils::private_path;
use crate::config::get_custom_config_dir;
use crate::core::Config;
use crate::geo::{self, Coordinate};
use crate::theme::Theme;

/// Why the record could not be loaded or saved.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The file exists but does not hold a valid record
    CorruptState(String),
    /// Reading or writing the file failed
    Persistence(String),
}

impl StoreError {
    /// Machine-readable name used on the IPC wire.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::CorruptState(_) => "corrupt_state",
            StoreError::Persistence(_) => "persistence",
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::CorruptState(reason) => write!(f, "corrupt state: {reason}"),
            StoreError::Persistence(reason) => write!(f, "could not persist state: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// On-disk shape of [`Config`].
#[derive(Debug, Serialize, Deserialize)]
struct PersistedRecord {
    automatic_switching: bool,
    coordinate: Coordinate,
    last_theme: Theme,
    #[serde(default)]
    last_solar_times_date: Option<NaiveDate>,
}

impl From<&Config> for PersistedRecord {
    fn from(config: &Config) -> Self {
        Self {
            automatic_switching: config.automatic_switching,
            coordinate: config.coordinate,
            last_theme: config.last_theme,
            last_solar_times_date: config.last_solar_times.map(|times| times.date),
        }
    }
}

impl From<PersistedRecord> for Config {
    fn from(record: PersistedRecord) -> Self {
        Self {
            automatic_switching: record.automatic_switching,
            coordinate: record.coordinate,
            last_theme: record.last_theme,
            last_solar_times: record
                .last_solar_times_date
                .map(|date| geo::compute(record.coordinate, date)),
        }
    }
}

/// File-backed storage for the scheduler record.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    path: PathBuf,
}

impl ScheduleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the state directory belonging to the active config directory.
    pub fn for_default_location() -> anyhow::Result<Self> {
        let config_dir = get_custom_config_dir();
        let state_dir = super::get_state_dir(config_dir.as_deref())?;
        Ok(Self::new(state_dir.join(STATE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record. A missing file yields the defaults.
    pub fn load(&self) -> Result<Config, StoreError> {
        if !self.path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            StoreError::Persistence(format!("reading {}: {e}", private_path(&self.path)))
        })?;

        let record: PersistedRecord = serde_json::from_str(&content).map_err(|e| {
            StoreError::CorruptState(format!("{}: {e}", private_path(&self.path)))
        })?;

        Ok(record.into())
    }

    /// Load the record, falling back to defaults on any error.
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log_pipe!();
                log_warning!("{e}");
                log_indented!("Starting from default state");
                Config::default()
            }
        }
    }

    /// Persist the record atomically.
    pub fn save(&self, config: &Config) -> Result<(), StoreError> {
        let persistence = |e: &dyn fmt::Display| {
            StoreError::Persistence(format!("writing {}: {e}", private_path(&self.path)))
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| persistence(&e))?;

        let json = serde_json::to_string_pretty(&PersistedRecord::from(config))
            .map_err(|e| persistence(&e))?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| persistence(&e))?;
        temp.write_all(json.as_bytes())
            .and_then(|_| temp.write_all(b"\n"))
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| persistence(&e))?;
        temp.persist(&self.path).map_err(|e| persistence(&e.error))?;

        Ok(())
    }
}
