//! Time source abstraction for real and manually driven clocks.
//!
//! The scheduler never calls `Utc::now()` directly; it asks an injected
//! [`TimeSource`]. Production code uses [`RealTimeSource`], tests and dry runs
//! use [`ManualTimeSource`] and move time explicitly, which makes sunrise and
//! sunset crossings reproducible without waiting for them.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};

/// Process-wide time source, used where no source is injected (log prefixes).
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Trait for abstracting the current instant.
pub trait TimeSource: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Whether this clock is driven manually rather than by the system.
    fn is_simulated(&self) -> bool;
}

/// System wall clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Clock that only moves when told to.
pub struct ManualTimeSource {
    current: Mutex<DateTime<Utc>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Jump to an absolute instant (may go backwards, like a clock correction).
    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut current) = self.current.lock() {
            *current = instant;
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: ChronoDuration) {
        if let Ok(mut current) = self.current.lock() {
            *current += by;
        }
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        match self.current.lock() {
            Ok(current) => *current,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Install the process-wide time source (first call wins).
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

/// Check if the time source has been initialized.
pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

/// The process-wide time source, defaulting to the real clock.
pub fn global() -> Arc<dyn TimeSource> {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .clone()
}

/// Current time from the process-wide time source.
pub fn now() -> DateTime<Utc> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource)).now()
}

/// Check if we're running on a manual clock.
pub fn is_simulated() -> bool {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .is_simulated()
}

/// Parse `YYYY-MM-DD HH:MM:SS` as a UTC instant.
pub fn parse_utc_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_time_source_moves_only_when_told() {
        let start = parse_utc_datetime("2024-06-21 02:00:00").unwrap();
        let clock = ManualTimeSource::new(start);
        assert_eq!(clock.now(), start);
        assert!(clock.is_simulated());

        clock.advance(ChronoDuration::minutes(105));
        assert_eq!(
            clock.now(),
            parse_utc_datetime("2024-06-21 03:45:00").unwrap()
        );

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_parse_utc_datetime_rejects_garbage() {
        assert!(parse_utc_datetime("2024-06-21T02:00:00").is_err());
        assert!(parse_utc_datetime("yesterday").is_err());
    }
}
