//! Lock file management for single-instance enforcement.
//!
//! The daemon holds an exclusive `fs2` lock on `sunswitch.lock` in the runtime
//! directory for its whole life. The file holds the PID (first line) and the
//! custom config directory, if any (second line). A lock file left behind by a
//! crashed daemon is recognized because nobody holds the lock on it anymore.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::constants::LOCK_FILE_NAME;
use crate::common::utils::{self, private_path};
use crate::config;

/// Default lock file location.
pub fn lock_path() -> PathBuf {
    utils::runtime_dir().join(LOCK_FILE_NAME)
}

/// A held lock; released and removed on drop.
#[derive(Debug)]
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}

/// Try to become the single running instance.
///
/// Returns `Ok(None)` when another live process holds the lock.
pub fn acquire_lock(path: &Path) -> Result<Option<LockFile>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", private_path(parent)))?;
    }

    // Keep existing content until the lock is ours
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", private_path(path)))?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    if let Some(previous) = read_pid(path)
        && previous != std::process::id()
    {
        log_warning!("Removing stale lock (process {previous} no longer running)");
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    match config::get_custom_config_dir() {
        Some(dir) => writeln!(file, "{}", dir.display())?,
        None => writeln!(file)?,
    }
    file.flush()?;

    Ok(Some(LockFile {
        file,
        path: path.to_path_buf(),
    }))
}

fn read_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()?
        .lines()
        .next()?
        .trim()
        .parse()
        .ok()
}

/// PID of the daemon holding the lock at `path`, if one is alive.
pub fn running_instance(path: &Path) -> Option<u32> {
    let pid = read_pid(path)?;
    if pid == std::process::id() {
        return Some(pid);
    }

    // If we can take the lock, nobody is holding it
    let file = OpenOptions::new().read(true).write(true).open(path).ok()?;
    if file.try_lock_exclusive().is_ok() {
        let _ = FileExt::unlock(&file);
        return None;
    }

    utils::is_process_running(pid).then_some(pid)
}
