//! The command boundary in front of the scheduler.
//!
//! Every caller (IPC clients, the settings watcher, the timer loop) goes
//! through [`CommandGateway`], which holds the only handle to the
//! [`Scheduler`] behind a single mutex. At most one transition runs at a time.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Config, ScheduledEvent, Scheduler};
use crate::geo::Coordinate;
use crate::io::signals::DaemonMessage;
use crate::state::StoreError;
use crate::theme::{Theme, ThemeApplier};

/// The next armed crossing as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextEvent {
    pub fire_at: DateTime<Utc>,
    pub target: Theme,
    /// Estimated; refined when it fires
    #[serde(default)]
    pub provisional: bool,
}

/// Snapshot returned by `get_config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigView {
    pub automatic_switching: bool,
    pub coordinate: Coordinate,
    pub last_theme: Theme,
    /// Local day the solar times belong to
    pub date: Option<NaiveDate>,
    /// `None` when unknown or on a polar day/night
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub next_event: Option<NextEvent>,
}

impl ConfigView {
    pub fn new(config: &Config, pending: Option<ScheduledEvent>) -> Self {
        let times = config.last_solar_times.filter(|times| !times.is_polar());
        Self {
            automatic_switching: config.automatic_switching,
            coordinate: config.coordinate,
            last_theme: config.last_theme,
            date: config.last_solar_times.map(|times| times.date),
            sunrise: times.map(|times| times.sunrise),
            sunset: times.map(|times| times.sunset),
            next_event: pending.map(|event| NextEvent {
                fire_at: event.fire_at,
                target: event.target,
                provisional: event.provisional,
            }),
        }
    }
}

/// Thread-safe façade over the scheduler.
#[derive(Clone)]
pub struct CommandGateway {
    scheduler: Arc<Mutex<Scheduler>>,
    wake: Option<Sender<DaemonMessage>>,
}

impl CommandGateway {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            wake: None,
        }
    }

    /// Notify the timer loop through `sender` after every mutating call.
    pub fn with_wake(mut self, sender: Sender<DaemonMessage>) -> Self {
        self.wake = Some(sender);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Scheduler> {
        self.scheduler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn wake_timer(&self) {
        if let Some(ref sender) = self.wake {
            let _ = sender.send(DaemonMessage::Wake);
        }
    }

    /// Run a mutating operation under the lock, then wake the timer loop.
    fn mutate<T>(&self, operation: impl FnOnce(&mut Scheduler) -> T) -> T {
        let result = {
            let mut scheduler = self.lock();
            operation(&mut scheduler)
        };
        self.wake_timer();
        result
    }

    /// Snapshot of the record. No side effects.
    pub fn get_config(&self) -> Config {
        self.lock().config().clone()
    }

    /// Snapshot of the record plus derived schedule information.
    pub fn view(&self) -> ConfigView {
        let scheduler = self.lock();
        ConfigView::new(scheduler.config(), scheduler.pending_event())
    }

    pub fn start(&self) -> Result<(), StoreError> {
        self.mutate(|scheduler| scheduler.start())
    }

    /// Manual theme selection; leaves automatic mode.
    pub fn change_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.mutate(|scheduler| scheduler.set_manual_theme(theme))
    }

    /// Turn sunrise/sunset switching on or off.
    pub fn change_sunset_option(&self, activated: bool) -> Result<(), StoreError> {
        self.mutate(|scheduler| scheduler.set_automatic_switching(activated))
    }

    pub fn change_location(&self, coordinate: Coordinate) -> Result<(), StoreError> {
        self.mutate(|scheduler| scheduler.on_coordinate_changed(coordinate))
    }

    pub fn set_applier(&self, applier: Box<dyn ThemeApplier>) {
        self.lock().set_applier(applier);
    }

    pub fn pending_event(&self) -> Option<ScheduledEvent> {
        self.lock().pending_event()
    }

    /// The scheduler's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.lock().now()
    }

    /// Fire the pending event if it is due at `now`. Returns whether it fired.
    pub fn fire_due(&self, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut scheduler = self.lock();
        match scheduler.pending_event() {
            Some(event) if event.fire_at <= now => {
                scheduler.on_timer_fired(event.generation)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn reevaluate(&self) -> Result<(), StoreError> {
        self.lock().reevaluate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{self, SolarTimes};

    #[test]
    fn test_view_hides_polar_sentinel() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let config = Config {
            last_solar_times: Some(SolarTimes::polar(date)),
            ..Config::default()
        };

        let view = ConfigView::new(&config, None);
        assert_eq!(view.date, Some(date));
        assert_eq!(view.sunrise, None);
        assert_eq!(view.sunset, None);
    }

    #[test]
    fn test_view_serialization() {
        let coordinate = Coordinate::new(51.5, -0.12).unwrap();
        let times = geo::compute(coordinate, NaiveDate::from_ymd_opt(2024, 6, 21).unwrap());
        let config = Config {
            automatic_switching: true,
            coordinate,
            last_theme: Theme::Light,
            last_solar_times: Some(times),
        };
        let pending = ScheduledEvent {
            fire_at: times.sunset,
            target: Theme::Dark,
            generation: 7,
            provisional: false,
        };

        let view = ConfigView::new(&config, Some(pending));
        let json: serde_json::Value = serde_json::to_value(&view).unwrap();
        assert_eq!(json["automatic_switching"], true);
        assert_eq!(json["last_theme"], "Light");
        assert_eq!(json["next_event"]["target"], "Dark");
        assert!(json["next_event"].get("generation").is_none());

        let back: ConfigView = serde_json::from_value(json).unwrap();
        assert_eq!(back, view);
    }
}
