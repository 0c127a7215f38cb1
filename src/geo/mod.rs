//! Geographic inputs of the scheduler.
//!
//! ## Module Structure
//!
//! - [`solar`]: sunrise/sunset calculation, polar edge cases, implied themes
//! - [`location`]: where the current coordinate comes from
//! - [`display`]: human-readable logging of solar times
//!
//! All instants are UTC. The "day" a computation belongs to is the mean
//! solar local date at the coordinate (see [`solar::local_date`]).

pub mod display;
pub mod location;
pub mod solar;

pub use display::log_solar_times;
pub use location::{LocationError, LocationProvider, SettingsLocationProvider, StaticLocation};
pub use solar::{Coordinate, CoordinateError, SolarTimes, compute, compute_for_instant, local_date};
