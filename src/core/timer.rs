//! The timer loop.
//!
//! One thread blocks on the daemon channel until the pending event is due,
//! the periodic re-evaluation is due, or a message arrives. Waits are cut into
//! chunks of at most [`MAX_TIMER_CHUNK_SECS`] and the wall clock is re-read
//! after each one, so suspend/resume and clock changes are noticed within a
//! minute.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use super::ScheduledEvent;
use super::gateway::CommandGateway;
use crate::common::constants::MAX_TIMER_CHUNK_SECS;
use crate::io::signals::DaemonMessage;

/// How long to block before the next look at the clock.
pub fn next_wait(
    now: DateTime<Utc>,
    pending: Option<ScheduledEvent>,
    until_recheck: Duration,
) -> Duration {
    let chunk = Duration::from_secs(MAX_TIMER_CHUNK_SECS);
    let until_event = pending
        .map(|event| (event.fire_at - now).to_std().unwrap_or(Duration::ZERO))
        .unwrap_or(chunk);

    until_event.min(until_recheck).min(chunk)
}

pub struct TimerLoop {
    gateway: CommandGateway,
    receiver: Receiver<DaemonMessage>,
    running: Arc<AtomicBool>,
    recheck_interval: Duration,
    debug_enabled: bool,
}

impl TimerLoop {
    pub fn new(
        gateway: CommandGateway,
        receiver: Receiver<DaemonMessage>,
        running: Arc<AtomicBool>,
        recheck_interval: Duration,
        debug_enabled: bool,
    ) -> Self {
        Self {
            gateway,
            receiver,
            running,
            recheck_interval,
            debug_enabled,
        }
    }

    pub fn set_recheck_interval(&mut self, interval: Duration) {
        self.recheck_interval = interval;
    }

    /// Run until shutdown. `on_settings_changed` is invoked on this thread for
    /// every [`DaemonMessage::SettingsChanged`].
    pub fn run(mut self, mut on_settings_changed: impl FnMut(&CommandGateway, &mut Self)) {
        let mut next_recheck = Instant::now() + self.recheck_interval;

        while self.running.load(Ordering::SeqCst) {
            let now = self.gateway.now();

            match self.gateway.fire_due(now) {
                Ok(true) => continue,
                Ok(false) => {}
                // Already logged; the record is retried on the next tick
                Err(_) => continue,
            }

            if Instant::now() >= next_recheck {
                self.reevaluate();
                next_recheck = Instant::now() + self.recheck_interval;
                continue;
            }

            let wait = next_wait(
                now,
                self.gateway.pending_event(),
                next_recheck.saturating_duration_since(Instant::now()),
            );

            match self.receiver.recv_timeout(wait) {
                Ok(DaemonMessage::Wake) | Err(RecvTimeoutError::Timeout) => {}
                Ok(DaemonMessage::Reevaluate) => {
                    self.reevaluate();
                    next_recheck = Instant::now() + self.recheck_interval;
                }
                Ok(DaemonMessage::SettingsChanged) => {
                    let gateway = self.gateway.clone();
                    on_settings_changed(&gateway, &mut self);
                }
                Ok(DaemonMessage::Shutdown) => {
                    self.running.store(false, Ordering::SeqCst);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    log_pipe!();
                    log_error!("Message channel disconnected, stopping timer");
                    self.running.store(false, Ordering::SeqCst);
                }
            }
        }

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Timer loop stopped");
        }
    }

    fn reevaluate(&self) {
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Periodic re-evaluation");
        }
        // Failures are logged by the scheduler and retried next time
        let _ = self.gateway.reevaluate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;
    use crate::time::source::parse_utc_datetime;

    fn event_at(s: &str) -> ScheduledEvent {
        ScheduledEvent {
            fire_at: parse_utc_datetime(s).unwrap(),
            target: Theme::Dark,
            generation: 1,
            provisional: false,
        }
    }

    #[test]
    fn test_wait_is_chunked() {
        let now = parse_utc_datetime("2024-06-21 12:00:00").unwrap();
        let far = Some(event_at("2024-06-21 20:21:00"));
        assert_eq!(
            next_wait(now, far, Duration::from_secs(300)),
            Duration::from_secs(60)
        );
        assert_eq!(
            next_wait(now, None, Duration::from_secs(3600)),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_wait_until_event_or_recheck() {
        let now = parse_utc_datetime("2024-06-21 12:00:00").unwrap();
        let soon = Some(event_at("2024-06-21 12:00:20"));
        assert_eq!(
            next_wait(now, soon, Duration::from_secs(300)),
            Duration::from_secs(20)
        );
        assert_eq!(
            next_wait(now, None, Duration::from_secs(5)),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_overdue_event_does_not_wait() {
        let now = parse_utc_datetime("2024-06-21 12:00:00").unwrap();
        let overdue = Some(event_at("2024-06-21 11:00:00"));
        assert_eq!(next_wait(now, overdue, Duration::from_secs(300)), Duration::ZERO);
    }
}
