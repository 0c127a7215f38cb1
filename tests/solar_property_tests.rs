use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use std::sync::Arc;
use sunswitch::core::{Config, Scheduler};
use sunswitch::geo::{self, Coordinate};
use sunswitch::state::ScheduleStore;
use sunswitch::theme::applier::NoopApplier;
use sunswitch::time::source::ManualTimeSource;

/// Generate valid latitude values
fn latitude_strategy() -> impl Strategy<Value = f64> {
    -90.0..=90.0
}

/// Generate valid longitude values
fn longitude_strategy() -> impl Strategy<Value = f64> {
    -180.0..=180.0
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..366 * 4).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + Duration::days(offset)
    })
}

proptest! {
    /// Sunrise precedes sunset on every ordinary day; everything else is the polar sentinel
    #[test]
    fn test_sunrise_before_sunset_or_polar(
        lat in latitude_strategy(),
        lon in longitude_strategy(),
        date in date_strategy()
    ) {
        let coordinate = Coordinate::new(lat, lon).unwrap();
        let times = geo::compute(coordinate, date);

        prop_assert_eq!(times.date, date);
        if times.is_polar() {
            prop_assert_eq!(times.implied_theme(date.and_hms_opt(12, 0, 0).unwrap().and_utc()), None);
        } else {
            prop_assert!(times.sunrise < times.sunset, "{lat},{lon} {date}: {:?}", times);
        }
    }

    /// Out-of-range coordinates are always rejected
    #[test]
    fn test_invalid_latitude_rejected(lat in 90.0001f64..1000.0, lon in longitude_strategy()) {
        prop_assert!(Coordinate::new(lat, lon).is_err());
        prop_assert!(Coordinate::new(-lat, lon).is_err());
    }

    /// In automatic mode the recorded theme matches the sun after enabling
    #[test]
    fn test_automatic_invariant_after_enabling(
        lat in -60.0f64..60.0,
        lon in longitude_strategy(),
        date in date_strategy(),
        seconds in 0i64..86_400
    ) {
        let now = date.and_hms_opt(0, 0, 0).unwrap().and_utc() + Duration::seconds(seconds);
        let coordinate = Coordinate::new(lat, lon).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualTimeSource::new(now));
        let config = Config {
            coordinate,
            ..Config::default()
        };
        let mut scheduler = Scheduler::with_config(
            config,
            ScheduleStore::new(dir.path().join("state.json")),
            Box::new(NoopApplier),
            clock,
            false,
        );
        scheduler.set_automatic_switching(true).unwrap();

        let times = geo::compute_for_instant(coordinate, now);
        if let Some(implied) = times.implied_theme(now) {
            prop_assert_eq!(scheduler.config().last_theme, implied);
        }
        let event = scheduler.pending_event().unwrap();
        prop_assert!(event.fire_at > now);
    }
}
