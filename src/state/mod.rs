//! Persistent scheduler state, following the XDG Base Directory layout.
//!
//! Settings (what the user edits) live in the config directory; the schedule
//! record (what the daemon decides) lives under `XDG_STATE_HOME`, namespaced
//! per config directory so `--config` instances never share state.

pub mod store;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::common::constants::APP_NAME;

pub use store::{ScheduleStore, StoreError};

/// State directory for a configuration directory.
///
/// `XDG_STATE_HOME/sunswitch/{namespace}` where namespace is `default` for the
/// default config directory and `custom_<hash>` for anything else.
pub fn get_state_dir(config_dir: Option<&Path>) -> Result<PathBuf> {
    let state_home = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local/state")
        });

    let namespace = match config_dir {
        None => "default".to_string(),
        Some(path) => {
            let default_config = dirs::config_dir()
                .context("Could not determine config directory")?
                .join(APP_NAME);
            if path == default_config {
                "default".to_string()
            } else {
                state_namespace(path)
            }
        }
    };

    Ok(state_home.join(APP_NAME).join(namespace))
}

/// Stable namespace for a custom config directory.
fn state_namespace(config_dir: &Path) -> String {
    let canonical = config_dir
        .canonicalize()
        .unwrap_or_else(|_| config_dir.to_path_buf());
    let hash = sha256::digest(canonical.to_string_lossy().as_bytes());
    format!("custom_{}", &hash[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_state_dir_namespaces() {
        let state_home = tempfile::tempdir().unwrap();
        let previous = std::env::var_os("XDG_STATE_HOME");
        unsafe { std::env::set_var("XDG_STATE_HOME", state_home.path()) };

        let default_dir = get_state_dir(None).unwrap();
        assert_eq!(default_dir, state_home.path().join("sunswitch").join("default"));

        let custom = tempfile::tempdir().unwrap();
        let custom_dir = get_state_dir(Some(custom.path())).unwrap();
        let name = custom_dir.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("custom_"));
        assert_eq!(name.len(), "custom_".len() + 16);

        // Same directory, same namespace
        assert_eq!(get_state_dir(Some(custom.path())).unwrap(), custom_dir);

        match previous {
            Some(value) => unsafe { std::env::set_var("XDG_STATE_HOME", value) },
            None => unsafe { std::env::remove_var("XDG_STATE_HOME") },
        }
    }
}
