//! The theme scheduler.
//!
//! [`Scheduler`] is the state machine that decides which theme should be
//! active. It has two states, keyed on `Config::automatic_switching`:
//!
//! - **Manual**: the user picked a theme; nothing is armed.
//! - **Automatic**: the theme follows the sun. Exactly one [`ScheduledEvent`]
//!   is pending (the next sunrise or sunset crossing) and, once a transition
//!   settles, `last_theme` equals the theme implied by the current solar times.
//!
//! Every mutating operation persists the record before returning. Persistence
//! failures are reported after the in-memory and host-visible effect has
//! happened and are retried on the next mutation or [`Scheduler::reevaluate`].
//! Applier failures never block anything; the intended theme is still recorded
//! and the apply is retried on the next re-evaluation.
//!
//! The scheduler does not own a thread. [`gateway::CommandGateway`] serializes
//! calls through a mutex and [`timer`] drives the wake-ups.

pub mod gateway;
pub mod model;
pub mod timer;

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::geo::{self, Coordinate, SolarTimes, display::format_instant};
use crate::state::{ScheduleStore, StoreError};
use crate::theme::{Theme, ThemeApplier};
use crate::time::source::TimeSource;

pub use model::{Config, ScheduledEvent};

pub struct Scheduler {
    config: Config,
    store: ScheduleStore,
    applier: Box<dyn ThemeApplier>,
    clock: Arc<dyn TimeSource>,
    pending: Option<ScheduledEvent>,
    /// Bumped on every arm or cancel
    generation: u64,
    /// The last save failed and the record on disk is behind
    needs_save: bool,
    /// The last apply failed and the host may show the wrong theme
    apply_failed: bool,
    debug_enabled: bool,
}

impl Scheduler {
    /// Create a scheduler from the persisted record, defaulting on any load error.
    pub fn new(
        store: ScheduleStore,
        applier: Box<dyn ThemeApplier>,
        clock: Arc<dyn TimeSource>,
        debug_enabled: bool,
    ) -> Self {
        let config = store.load_or_default();
        Self::with_config(config, store, applier, clock, debug_enabled)
    }

    /// Create a scheduler from an explicit record.
    pub fn with_config(
        config: Config,
        store: ScheduleStore,
        applier: Box<dyn ThemeApplier>,
        clock: Arc<dyn TimeSource>,
        debug_enabled: bool,
    ) -> Self {
        Self {
            config,
            store,
            applier,
            clock,
            pending: None,
            generation: 0,
            needs_save: false,
            apply_failed: false,
            debug_enabled,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pending_event(&self) -> Option<ScheduledEvent> {
        self.pending
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Swap the applier, e.g. after the settings file changed.
    pub fn set_applier(&mut self, applier: Box<dyn ThemeApplier>) {
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Applier {} replaced by {}", self.applier.name(), applier.name());
        }
        self.applier = applier;
    }

    /// Bring the host in line with the record after a (re)start.
    ///
    /// In Automatic the implied theme is applied even when it matches
    /// `last_theme`, since the host may have changed while nothing was running.
    pub fn start(&mut self) -> Result<(), StoreError> {
        if !self.config.automatic_switching {
            log_block_start!(
                "Manual mode, keeping {} theme",
                self.config.last_theme
            );
            return if self.needs_save { self.persist() } else { Ok(()) };
        }

        let now = self.clock.now();
        let times = self.refresh_solar_times(now, false);
        geo::log_solar_times(self.config.coordinate, &times);

        match times.implied_theme(now) {
            Some(implied) => self.apply(implied),
            None => {
                log_block_start!(
                    "No sunrise or sunset today, keeping {} theme",
                    self.config.last_theme
                );
            }
        }

        self.arm_next(now, &times);
        self.persist()
    }

    /// Switch to `theme` and leave automatic mode.
    ///
    /// The applier is invoked even if `theme` is already active.
    pub fn set_manual_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        if self.config.automatic_switching {
            log_block_start!("Automatic switching disabled by manual theme change");
        }
        self.cancel_pending();
        self.config.automatic_switching = false;
        self.apply(theme);
        self.persist()
    }

    /// Turn automatic switching on or off.
    pub fn set_automatic_switching(&mut self, enabled: bool) -> Result<(), StoreError> {
        if !enabled {
            self.cancel_pending();
            if self.config.automatic_switching {
                log_block_start!(
                    "Automatic switching disabled, keeping {} theme",
                    self.config.last_theme
                );
            }
            self.config.automatic_switching = false;
            return self.persist();
        }

        if !self.config.automatic_switching {
            log_block_start!("Automatic switching enabled");
        }
        self.config.automatic_switching = true;
        self.evaluate_and_arm(false);
        self.persist()
    }

    /// Handle a wake-up of the armed event identified by `generation`.
    ///
    /// Stale wake-ups (the event was replaced or cancelled since) and wake-ups
    /// in Manual mode are ignored.
    pub fn on_timer_fired(&mut self, generation: u64) -> Result<(), StoreError> {
        let Some(event) = self.pending else {
            return Ok(());
        };
        if event.generation != generation {
            if self.debug_enabled {
                log_pipe!();
                log_debug!(
                    "Ignoring stale wake-up (generation {generation}, current {})",
                    event.generation
                );
            }
            return Ok(());
        }
        if !self.config.automatic_switching {
            self.cancel_pending();
            return Ok(());
        }

        let now = self.clock.now();
        self.pending = None;
        let times = self.refresh_solar_times(now, false);

        match times.implied_theme(now) {
            Some(implied) if implied == event.target => self.apply(implied),
            // Woke up past more than one boundary (suspend, clock change)
            Some(implied) if implied != self.config.last_theme => {
                if self.debug_enabled {
                    log_pipe!();
                    log_debug!(
                        "Expected {} at {}, but {} is due now",
                        event.target,
                        format_instant(event.fire_at),
                        implied
                    );
                }
                self.apply(implied);
            }
            Some(_) => {
                // An estimated event that fired before the real boundary
                if self.debug_enabled && event.provisional {
                    log_pipe!();
                    log_debug!("Estimated wake-up arrived early, refining");
                }
            }
            None => {
                if self.debug_enabled {
                    log_pipe!();
                    log_debug!("Polar day or night, keeping {}", self.config.last_theme);
                }
            }
        }

        self.arm_next(now, &times);
        self.persist()
    }

    /// Take a new coordinate into account.
    ///
    /// In Automatic this re-evaluates exactly like enabling; in Manual the
    /// coordinate (and its derived solar times) is only stored.
    pub fn on_coordinate_changed(&mut self, coordinate: Coordinate) -> Result<(), StoreError> {
        if coordinate == self.config.coordinate && self.config.last_solar_times.is_some() {
            return if self.needs_save { self.persist() } else { Ok(()) };
        }

        log_block_start!("Location changed to {coordinate}");
        self.config.coordinate = coordinate;

        if self.config.automatic_switching {
            self.evaluate_and_arm(true);
        } else {
            let now = self.clock.now();
            self.refresh_solar_times(now, true);
        }
        self.persist()
    }

    /// Periodic self-check.
    ///
    /// Retries a failed save or apply, picks up date rollover and clock jumps,
    /// and makes sure an event is armed in Automatic mode.
    pub fn reevaluate(&mut self) -> Result<(), StoreError> {
        let mut changed = false;

        if self.config.automatic_switching {
            let now = self.clock.now();
            let previous_date = self.config.last_solar_times.map(|t| t.date);
            let times = self.refresh_solar_times(now, false);
            let rolled_over = previous_date != Some(times.date);
            changed |= rolled_over;

            let mut applied = false;
            if let Some(implied) = times.implied_theme(now)
                && (implied != self.config.last_theme || self.apply_failed)
            {
                if self.debug_enabled {
                    log_pipe!();
                    log_debug!("Re-evaluation: {implied} is due");
                }
                self.apply(implied);
                applied = true;
                changed = true;
            }

            let pending_stale = self.pending.is_none_or(|event| event.fire_at <= now);
            if rolled_over || applied || pending_stale {
                self.arm_next(now, &times);
            }
        } else if self.apply_failed {
            let theme = self.config.last_theme;
            self.apply(theme);
        }

        if changed || self.needs_save {
            self.persist()
        } else {
            Ok(())
        }
    }

    /// Apply the implied theme if it differs and arm the next crossing.
    fn evaluate_and_arm(&mut self, force_recompute: bool) {
        let now = self.clock.now();
        let times = self.refresh_solar_times(now, force_recompute);
        if self.debug_enabled {
            geo::log_solar_times(self.config.coordinate, &times);
        }

        if let Some(implied) = times.implied_theme(now)
            && implied != self.config.last_theme
        {
            self.apply(implied);
        }

        self.arm_next(now, &times);
    }

    /// Solar times for the local day containing `now`, recomputed when the
    /// day changed or when forced.
    fn refresh_solar_times(&mut self, now: DateTime<Utc>, force: bool) -> SolarTimes {
        let date = geo::local_date(now, self.config.coordinate);
        match self.config.last_solar_times {
            Some(times) if times.date == date && !force => times,
            _ => {
                let times = geo::compute(self.config.coordinate, date);
                self.config.last_solar_times = Some(times);
                times
            }
        }
    }

    /// Replace the pending event with the next crossing strictly after `now`.
    fn arm_next(&mut self, now: DateTime<Utc>, times: &SolarTimes) {
        self.generation += 1;

        let (fire_at, target, provisional) = match times.next_boundary_after(now) {
            Some((at, target)) => (at, target, false),
            None if !times.is_polar() => {
                // Both boundaries passed; tomorrow's sunrise is close to today's
                (times.sunrise + Duration::days(1), Theme::Light, true)
            }
            None => {
                // Look again at the start of the next local day
                let offset =
                    Duration::seconds((self.config.coordinate.longitude() / 15.0 * 3600.0).round() as i64);
                let next_day = SolarTimes::polar(times.date + Duration::days(1)).sunrise - offset;
                (next_day, self.config.last_theme.opposite(), true)
            }
        };
        let fire_at = fire_at.max(now + Duration::seconds(1));

        let event = ScheduledEvent {
            fire_at,
            target,
            generation: self.generation,
            provisional,
        };
        self.pending = Some(event);

        if provisional {
            log_indented!("Next check around {}", format_instant(fire_at));
        } else {
            log_indented!("Next switch to {target} at {}", format_instant(fire_at));
        }
    }

    fn cancel_pending(&mut self) {
        if self.pending.take().is_some() && self.debug_enabled {
            log_pipe!();
            log_debug!("Cancelled pending event");
        }
        self.generation += 1;
    }

    /// Invoke the applier and record `theme` as the intended theme.
    fn apply(&mut self, theme: Theme) {
        self.config.last_theme = theme;
        match self.applier.apply(theme) {
            Ok(()) => {
                self.apply_failed = false;
                log_block_start!("Switched to {theme} theme");
            }
            Err(e) => {
                self.apply_failed = true;
                log_pipe!();
                log_error!("{e}");
                log_indented!("Will retry on the next check");
            }
        }
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        match self.store.save(&self.config) {
            Ok(()) => {
                self.needs_save = false;
                Ok(())
            }
            Err(e) => {
                self.needs_save = true;
                log_pipe!();
                log_warning!("{e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ApplyError;
    use crate::time::source::ManualTimeSource;
    use std::sync::Mutex;

    /// Records every theme it is asked to apply.
    #[derive(Clone, Default)]
    struct RecordingApplier {
        calls: Arc<Mutex<Vec<Theme>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl ThemeApplier for RecordingApplier {
        fn apply(&mut self, theme: Theme) -> Result<(), ApplyError> {
            self.calls.lock().unwrap().push(theme);
            if *self.fail.lock().unwrap() {
                return Err(ApplyError {
                    applier: "Recording",
                    theme,
                    reason: "forced failure".to_string(),
                });
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Recording"
        }
    }

    fn london() -> Coordinate {
        Coordinate::new(51.5, -0.12).unwrap()
    }

    fn setup(
        now: &str,
        config: Config,
    ) -> (
        Scheduler,
        RecordingApplier,
        Arc<ManualTimeSource>,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let store = ScheduleStore::new(dir.path().join("state.json"));
        let clock = Arc::new(ManualTimeSource::new(
            crate::time::source::parse_utc_datetime(now).unwrap(),
        ));
        let applier = RecordingApplier::default();
        let scheduler = Scheduler::with_config(
            config,
            store,
            Box::new(applier.clone()),
            clock.clone(),
            false,
        );
        (scheduler, applier, clock, dir)
    }

    fn automatic_london() -> Config {
        Config {
            automatic_switching: true,
            coordinate: london(),
            ..Config::default()
        }
    }

    #[test]
    fn test_start_reapplies_even_when_unchanged() {
        let (mut scheduler, applier, _clock, _dir) =
            setup("2024-06-21 12:00:00", automatic_london());

        scheduler.start().unwrap();

        assert_eq!(*applier.calls.lock().unwrap(), vec![Theme::Light]);
        assert_eq!(scheduler.config().last_theme, Theme::Light);
        let event = scheduler.pending_event().unwrap();
        assert_eq!(event.target, Theme::Dark);
        assert!(!event.provisional);
    }

    #[test]
    fn test_start_in_manual_does_nothing() {
        let (mut scheduler, applier, _clock, _dir) =
            setup("2024-06-21 12:00:00", Config::default());

        scheduler.start().unwrap();

        assert!(applier.calls.lock().unwrap().is_empty());
        assert_eq!(scheduler.pending_event(), None);
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let (mut scheduler, applier, clock, _dir) =
            setup("2024-06-21 12:00:00", automatic_london());
        scheduler.set_automatic_switching(true).unwrap();
        let stale = scheduler.pending_event().unwrap();

        scheduler.set_automatic_switching(true).unwrap();
        let current = scheduler.pending_event().unwrap();
        assert_ne!(stale.generation, current.generation);

        clock.set(current.fire_at);
        scheduler.on_timer_fired(stale.generation).unwrap();
        assert_eq!(scheduler.pending_event(), Some(current));
        assert!(applier.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_timer_fired_after_disabling_does_nothing() {
        let (mut scheduler, applier, clock, _dir) =
            setup("2024-06-21 12:00:00", automatic_london());
        scheduler.set_automatic_switching(true).unwrap();
        let armed = scheduler.pending_event().unwrap();
        applier.calls.lock().unwrap().clear();

        scheduler.set_automatic_switching(false).unwrap();
        clock.set(armed.fire_at);
        scheduler.on_timer_fired(armed.generation).unwrap();

        assert!(applier.calls.lock().unwrap().is_empty());
        assert_eq!(scheduler.config().last_theme, Theme::Light);
        assert_eq!(scheduler.pending_event(), None);
    }

    #[test]
    fn test_timer_fired_in_manual_cancels_armed_event() {
        let (mut scheduler, applier, clock, _dir) =
            setup("2024-06-21 12:00:00", automatic_london());
        scheduler.set_automatic_switching(true).unwrap();
        let armed = scheduler.pending_event().unwrap();
        applier.calls.lock().unwrap().clear();

        // Record switched to Manual while the event is still armed
        scheduler.config.automatic_switching = false;
        clock.set(armed.fire_at);
        scheduler.on_timer_fired(armed.generation).unwrap();

        assert!(applier.calls.lock().unwrap().is_empty());
        assert_eq!(scheduler.config().last_theme, Theme::Light);
        assert_eq!(scheduler.pending_event(), None);
    }

    #[test]
    fn test_disabling_keeps_theme_and_cancels() {
        let (mut scheduler, applier, _clock, _dir) =
            setup("2024-06-21 22:00:00", automatic_london());
        scheduler.set_automatic_switching(true).unwrap();
        assert_eq!(scheduler.config().last_theme, Theme::Dark);

        scheduler.set_automatic_switching(false).unwrap();

        assert_eq!(scheduler.pending_event(), None);
        assert!(!scheduler.config().automatic_switching);
        assert_eq!(scheduler.config().last_theme, Theme::Dark);
        assert_eq!(*applier.calls.lock().unwrap(), vec![Theme::Dark]);
    }

    #[test]
    fn test_after_sunset_arms_provisional_sunrise() {
        let (mut scheduler, _applier, clock, _dir) =
            setup("2024-06-21 22:00:00", automatic_london());
        scheduler.set_automatic_switching(true).unwrap();

        let event = scheduler.pending_event().unwrap();
        let today = scheduler.config().last_solar_times.unwrap();
        assert!(event.provisional);
        assert_eq!(event.target, Theme::Light);
        assert_eq!(event.fire_at, today.sunrise + Duration::days(1));

        // Tomorrow's real sunrise is slightly later than the estimate
        clock.set(event.fire_at);
        scheduler.on_timer_fired(event.generation).unwrap();

        let refined = scheduler.pending_event().unwrap();
        let tomorrow = scheduler.config().last_solar_times.unwrap();
        assert_eq!(tomorrow.date, today.date + Duration::days(1));
        assert!(refined.fire_at > event.fire_at);
        match refined.target {
            // The estimate was early: re-armed to the precise sunrise
            Theme::Light => {
                assert!(!refined.provisional);
                assert_eq!(refined.fire_at, tomorrow.sunrise);
                assert_eq!(scheduler.config().last_theme, Theme::Dark);
            }
            // The estimate was late: Light applied, sunset armed
            Theme::Dark => {
                assert_eq!(refined.fire_at, tomorrow.sunset);
                assert_eq!(scheduler.config().last_theme, Theme::Light);
            }
        }
    }

    #[test]
    fn test_wake_after_two_boundaries_keeps_current_theme() {
        let (mut scheduler, applier, clock, _dir) =
            setup("2024-06-21 12:00:00", automatic_london());
        scheduler.start().unwrap();
        let event = scheduler.pending_event().unwrap();
        assert_eq!(event.target, Theme::Dark);

        // Suspended through sunset and the following sunrise
        clock.set(crate::time::source::parse_utc_datetime("2024-06-22 09:00:00").unwrap());
        scheduler.on_timer_fired(event.generation).unwrap();

        assert_eq!(scheduler.config().last_theme, Theme::Light);
        assert_eq!(*applier.calls.lock().unwrap(), vec![Theme::Light]);
        let next = scheduler.pending_event().unwrap();
        let today = scheduler.config().last_solar_times.unwrap();
        assert_eq!(next.target, Theme::Dark);
        assert_eq!(next.fire_at, today.sunset);
        assert!(next.fire_at > clock.now());
    }

    #[test]
    fn test_failed_apply_is_retried_on_reevaluate() {
        let (mut scheduler, applier, _clock, _dir) =
            setup("2024-06-21 12:00:00", automatic_london());
        *applier.fail.lock().unwrap() = true;

        scheduler.start().unwrap();
        assert_eq!(scheduler.config().last_theme, Theme::Light);

        *applier.fail.lock().unwrap() = false;
        scheduler.reevaluate().unwrap();
        assert_eq!(
            *applier.calls.lock().unwrap(),
            vec![Theme::Light, Theme::Light]
        );

        // Nothing left to retry
        scheduler.reevaluate().unwrap();
        assert_eq!(applier.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_manual_coordinate_change_only_stores() {
        let (mut scheduler, applier, _clock, _dir) =
            setup("2024-06-21 12:00:00", Config::default());
        let tokyo = Coordinate::new(35.6762, 139.6503).unwrap();

        scheduler.on_coordinate_changed(tokyo).unwrap();

        assert_eq!(scheduler.config().coordinate, tokyo);
        assert_eq!(scheduler.pending_event(), None);
        assert!(applier.calls.lock().unwrap().is_empty());
        assert_eq!(
            scheduler.config().last_solar_times.unwrap().date,
            chrono::NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()
        );
    }

    #[test]
    fn test_polar_day_keeps_theme_and_checks_tomorrow() {
        let tromso = Coordinate::new(69.65, 18.96).unwrap();
        let config = Config {
            automatic_switching: true,
            coordinate: tromso,
            last_theme: Theme::Dark,
            last_solar_times: None,
        };
        let (mut scheduler, applier, _clock, _dir) = setup("2024-06-21 12:00:00", config);

        scheduler.start().unwrap();

        assert!(applier.calls.lock().unwrap().is_empty());
        assert_eq!(scheduler.config().last_theme, Theme::Dark);
        let event = scheduler.pending_event().unwrap();
        assert!(event.provisional);
        assert!(event.fire_at > scheduler.now());
        assert!(event.fire_at <= scheduler.now() + Duration::days(1));
    }
}
