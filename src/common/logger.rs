//! Structured logging with box-drawing output.
//!
//! Every message sunswitch prints goes through the macros in this module so the
//! daemon, the one-shot commands and the tests share one visual style:
//!
//! ```text
//! ┏ sunswitch v0.3.0 ━━╸
//! ┃
//! ┣ Automatic switching enabled
//! ┃   Sunrise: 03:43 UTC
//! ┃   Sunset:  20:21 UTC
//! ┣[WARNING] Failed to persist state, will retry
//! ╹
//! ```
//!
//! ## Conventions
//!
//! - `log_block_start!` opens a new conceptual block (adds a spacer pipe first).
//! - `log_decorated!` continues the current block.
//! - `log_indented!` prints nested detail lines under a block.
//! - `log_pipe!` inserts an empty spacer, typically before a semantic message.
//! - `log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!`
//!   carry a colored `[LEVEL]` tag.
//! - `log_error_exit!` closes the flow with `┗[ERROR]`.
//! - `log_version!` / `log_end!` frame a whole run.
//!
//! Output can be silenced at runtime with [`Log::set_enabled`] (one-shot JSON
//! commands do this) and routed to a file with [`Log::start_file_logging`].

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Set once when --log is passed
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Logging control surface used by the macros.
pub struct Log;

impl Log {
    /// Enable or disable all log output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Route all further output to `file_path` instead of stdout.
    ///
    /// Output is written by a dedicated thread; the returned guard flushes and
    /// joins it when dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || {
                let mut file = std::fs::File::create(&file_path)?;
                loop {
                    match rx.recv() {
                        Ok(LogMessage::Formatted(text)) => file.write_all(text.as_bytes())?,
                        Ok(LogMessage::Shutdown) | Err(_) => {
                            file.flush()?;
                            break;
                        }
                    }
                }
                Ok::<(), anyhow::Error>(())
            })?;

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix shown while a manual (simulated) clock is installed.
    ///
    /// Real-time runs print no timestamps; the terminal or journal adds its own.
    pub fn get_timestamp_prefix() -> String {
        if crate::time::source::is_initialized() && crate::time::source::is_simulated() {
            format!("[{}] ", crate::time::source::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Flushes the file sink on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Write an already formatted line to the active sink.
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Render one log line: `lead` goes between the timestamp and the message.
///
/// `spaced` adds an empty pipe line before the message (block starts).
pub fn emit(lead: &str, message: std::fmt::Arguments<'_>, spaced: bool) {
    if !Log::is_enabled() {
        return;
    }
    let prefix = Log::get_timestamp_prefix();
    let formatted = if spaced {
        format!("{prefix}┃\n{prefix}{lead}{message}\n")
    } else {
        format!("{prefix}{lead}{message}\n")
    };
    write_output(&formatted);
}

// # Logging Macros

/// Continue the current block: `┣ message`.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => {
        $crate::common::logger::emit("┣ ", format_args!($($arg)+), false)
    };
}

/// Nested detail line: `┃   message`.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => {
        $crate::common::logger::emit("┃   ", format_args!($($arg)+), false)
    };
}

/// Empty spacer line: `┃`.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::common::logger::emit("┃", format_args!(""), false)
    };
}

/// Start a new block: spacer pipe, then `┣ message`.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => {
        $crate::common::logger::emit("┣ ", format_args!($($arg)+), true)
    };
}

/// Application header: `┏ sunswitch vX.Y.Z ━━╸`.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::common::logger::emit(
            "┏ ",
            format_args!("sunswitch v{} ━━╸", env!("CARGO_PKG_VERSION")),
            false,
        )
    };
}

/// Final termination marker: `╹`.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::common::logger::emit("╹", format_args!(""), false)
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => {
        $crate::common::logger::emit("┣[\x1b[33mWARNING\x1b[0m] ", format_args!($($arg)+), false)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::common::logger::emit("┣[\x1b[31mERROR\x1b[0m] ", format_args!($($arg)+), false)
    };
}

/// Error that ends the current flow: spacer pipe, then `┗[ERROR] message`.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => {
        $crate::common::logger::emit("┗[\x1b[31mERROR\x1b[0m] ", format_args!($($arg)+), true)
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::common::logger::emit("┣[\x1b[32mINFO\x1b[0m] ", format_args!($($arg)+), false)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        $crate::common::logger::emit("┣[\x1b[32mDEBUG\x1b[0m] ", format_args!($($arg)+), false)
    };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => {
        $crate::common::logger::emit("┣[\x1b[31mCRITICAL\x1b[0m] ", format_args!($($arg)+), false)
    };
}
