//! Settings file watching.
//!
//! Editors save in several steps (temp file, rename, chmod), so the parent
//! directory is watched non-recursively and events are filtered down to the
//! settings file name, then debounced before the daemon is told to reload.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use crate::common::utils::private_path;
use crate::io::signals::DaemonMessage;

/// Minimum time between two reload messages
const DEBOUNCE_MS: u64 = 500;

/// Watch `settings_path` and send [`DaemonMessage::SettingsChanged`] on edits.
///
/// The watcher lives on its own thread until the receiving end hangs up.
pub fn start_settings_watcher(
    settings_path: PathBuf,
    sender: Sender<DaemonMessage>,
    debug_enabled: bool,
) -> Result<()> {
    let Some(watch_dir) = settings_path.parent().map(Path::to_path_buf) else {
        anyhow::bail!(
            "Settings path {} has no parent directory",
            private_path(&settings_path)
        );
    };

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res
                && matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                )
            {
                let _ = tx.send(event);
            }
        },
        NotifyConfig::default(),
    )
    .context("Failed to create settings watcher")?;

    watcher
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", private_path(&watch_dir)))?;

    if debug_enabled {
        log_pipe!();
        log_debug!("Watching {} for changes", private_path(&settings_path));
    }

    thread::spawn(move || {
        // Dropping the watcher stops event delivery
        let _watcher = watcher;
        let mut last_reload: Option<Instant> = None;

        for event in rx {
            if !affects_settings(&event, &settings_path) {
                continue;
            }

            if let Some(last) = last_reload
                && last.elapsed() < Duration::from_millis(DEBOUNCE_MS)
            {
                continue;
            }

            if debug_enabled {
                log_pipe!();
                log_debug!("Settings file change detected");
            }

            if sender.send(DaemonMessage::SettingsChanged).is_err() {
                break;
            }
            last_reload = Some(Instant::now());
        }
    });

    Ok(())
}

/// Whether a filesystem event touches the settings file (or an editor's
/// temporary copy of it).
fn affects_settings(event: &Event, settings_path: &Path) -> bool {
    let Some(settings_name) = settings_path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    event.paths.iter().any(|path| {
        path.parent() == settings_path.parent()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name == settings_name || name.starts_with(settings_name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_only_settings_file_events_count() {
        let settings = Path::new("/home/user/.config/sunswitch/sunswitch.toml");

        assert!(affects_settings(
            &event(
                EventKind::Modify(ModifyKind::Any),
                "/home/user/.config/sunswitch/sunswitch.toml"
            ),
            settings
        ));
        assert!(affects_settings(
            &event(
                EventKind::Create(CreateKind::File),
                "/home/user/.config/sunswitch/sunswitch.toml.swp"
            ),
            settings
        ));
        assert!(!affects_settings(
            &event(
                EventKind::Modify(ModifyKind::Any),
                "/home/user/.config/sunswitch/notes.txt"
            ),
            settings
        ));
        assert!(!affects_settings(
            &event(
                EventKind::Modify(ModifyKind::Any),
                "/home/user/.config/other/sunswitch.toml"
            ),
            settings
        ));
    }
}
