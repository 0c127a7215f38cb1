//! Sunrise and sunset calculation.
//!
//! [`compute`] is a pure function of a [`Coordinate`] and a calendar date. The
//! heavy lifting is done by the `sunrise` crate; this module adds coordinate
//! validation, the polar day/night edge case and the scheduler-facing helpers
//! (which theme an instant implies, which boundary comes next).
//!
//! ## Polar regions
//!
//! Above the polar circles the sun may not cross the horizon at all on a given
//! date. The standard hour-angle formula has no solution there, so instead of
//! inventing times we return a sentinel [`SolarTimes`] with
//! `sunrise == sunset == 00:00 UTC` of the date. Callers check
//! [`SolarTimes::is_polar`] and keep whatever theme was last applied.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use sunrise::{Coordinates, SolarDay, SolarEvent};

use crate::common::constants::{AXIAL_TILT_DEGREES, SUNRISE_ALTITUDE_DEGREES};
use crate::theme::Theme;

/// Geographic position in degrees.
///
/// Latitude is within [-90, 90] and longitude within [-180, 180]; the only
/// way to build one from untrusted input is [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

/// A latitude or longitude outside its valid range.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateError {
    Latitude(f64),
    Longitude(f64),
}

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateError::Latitude(lat) => {
                write!(f, "latitude must be between -90 and 90 degrees (got {lat})")
            }
            CoordinateError::Longitude(lon) => {
                write!(f, "longitude must be between -180 and 180 degrees (got {lon})")
            }
        }
    }
}

impl std::error::Error for CoordinateError {}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        // NaN fails both range checks
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.latitude >= 0.0 { "N" } else { "S" };
        let ew = if self.longitude >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.4}°{ns}, {:.4}°{ew}",
            self.latitude.abs(),
            self.longitude.abs()
        )
    }
}

/// Sunrise and sunset of one local day, as UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarTimes {
    /// Local (mean solar) date these times belong to
    pub date: NaiveDate,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

impl SolarTimes {
    /// Sentinel for days on which the sun does not rise or does not set.
    pub fn polar(date: NaiveDate) -> Self {
        let start_of_day = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        Self {
            date,
            sunrise: start_of_day,
            sunset: start_of_day,
        }
    }

    pub fn is_polar(&self) -> bool {
        self.sunrise == self.sunset
    }

    /// Theme implied by `now`: Light inside `[sunrise, sunset)`, Dark outside.
    ///
    /// Returns `None` for the polar sentinel, where no automatic decision is made.
    pub fn implied_theme(&self, now: DateTime<Utc>) -> Option<Theme> {
        if self.is_polar() {
            None
        } else if now >= self.sunrise && now < self.sunset {
            Some(Theme::Light)
        } else {
            Some(Theme::Dark)
        }
    }

    /// The first boundary of this day strictly after `now`, with the theme it starts.
    pub fn next_boundary_after(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, Theme)> {
        if self.is_polar() {
            None
        } else if now < self.sunrise {
            Some((self.sunrise, Theme::Light))
        } else if now < self.sunset {
            Some((self.sunset, Theme::Dark))
        } else {
            None
        }
    }
}

/// Which way the sun behaves on a given date at a given latitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DaylightKind {
    Normal,
    PolarDay,
    PolarNight,
}

/// Approximate solar declination in degrees for a day of the year.
fn solar_declination(date: NaiveDate) -> f64 {
    let day_of_year = date.ordinal() as f64;
    -AXIAL_TILT_DEGREES * (2.0 * std::f64::consts::PI / 365.0 * (day_of_year + 10.0)).cos()
}

fn classify_daylight(latitude: f64, date: NaiveDate) -> DaylightKind {
    let declination = solar_declination(date);
    let phi = latitude.to_radians();
    let delta = declination.to_radians();
    let denominator = phi.cos() * delta.cos();

    // At the poles the sun circles at constant altitude for the whole day
    if denominator.abs() < 1e-9 {
        return if latitude * declination > 0.0 {
            DaylightKind::PolarDay
        } else {
            DaylightKind::PolarNight
        };
    }

    let cos_hour_angle =
        (SUNRISE_ALTITUDE_DEGREES.to_radians().sin() - phi.sin() * delta.sin()) / denominator;

    if cos_hour_angle > 1.0 {
        DaylightKind::PolarNight
    } else if cos_hour_angle < -1.0 {
        DaylightKind::PolarDay
    } else {
        DaylightKind::Normal
    }
}

/// Compute sunrise and sunset for `coordinate` on `date`.
///
/// Never fails for a valid coordinate; polar days and nights yield the
/// [`SolarTimes::polar`] sentinel.
pub fn compute(coordinate: Coordinate, date: NaiveDate) -> SolarTimes {
    if classify_daylight(coordinate.latitude, date) != DaylightKind::Normal {
        return SolarTimes::polar(date);
    }

    let Some(coords) = Coordinates::new(coordinate.latitude, coordinate.longitude) else {
        return SolarTimes::polar(date);
    };
    let solar_day = SolarDay::new(coords, date);
    let sunrise = solar_day.event_time(SolarEvent::Sunrise);
    let sunset = solar_day.event_time(SolarEvent::Sunset);

    // Near the polar circles the declination estimate and the crate can
    // disagree by a day; anything implausible is treated as polar.
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let plausible = |t: DateTime<Utc>| {
        t > midnight - Duration::days(1) && t < midnight + Duration::days(2)
    };
    if sunrise >= sunset || !plausible(sunrise) || !plausible(sunset) {
        return SolarTimes::polar(date);
    }

    SolarTimes {
        date,
        sunrise,
        sunset,
    }
}

/// The local calendar date of `now` at `coordinate`.
///
/// Uses mean solar time (UTC shifted by longitude / 15 hours), which keeps the
/// sunrise and sunset of one computed day inside the same local day without
/// needing a timezone database.
pub fn local_date(now: DateTime<Utc>, coordinate: Coordinate) -> NaiveDate {
    let offset_seconds = (coordinate.longitude / 15.0 * 3600.0).round() as i64;
    (now + Duration::seconds(offset_seconds)).date_naive()
}

/// Solar times for the local day containing `now`.
pub fn compute_for_instant(coordinate: Coordinate, now: DateTime<Utc>) -> SolarTimes {
    compute(coordinate, local_date(now, coordinate))
}
