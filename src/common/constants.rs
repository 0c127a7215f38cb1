//! Application-wide constants: defaults, validation limits and file names.

// # Timer behavior

/// Longest uninterrupted wait of the timer loop, in seconds.
///
/// The loop re-reads the wall clock at least this often so suspend/resume and
/// manual clock changes are noticed without a dedicated sleep monitor.
pub const MAX_TIMER_CHUNK_SECS: u64 = 60;

/// Default interval between periodic re-evaluations, in seconds.
pub const DEFAULT_RECHECK_INTERVAL: u64 = 300;
pub const MINIMUM_RECHECK_INTERVAL: u64 = 30;
pub const MAXIMUM_RECHECK_INTERVAL: u64 = 3600;

// # Theme appliers

/// Deadline for a single applier command, in milliseconds.
pub const APPLY_TIMEOUT_MS: u64 = 10_000;

// # Solar calculation

/// Standard apparent altitude of the sun's upper limb at sunrise/sunset,
/// including atmospheric refraction.
pub const SUNRISE_ALTITUDE_DEGREES: f64 = -0.833;

/// Earth's axial tilt, used for the polar day/night pre-check.
pub const AXIAL_TILT_DEGREES: f64 = 23.44;

// # Files and sockets

pub const APP_NAME: &str = "sunswitch";
pub const SETTINGS_FILE_NAME: &str = "sunswitch.toml";
pub const STATE_FILE_NAME: &str = "state.json";
pub const LOCK_FILE_NAME: &str = "sunswitch.lock";
pub const SOCKET_FILE_NAME: &str = "sunswitch.sock";

/// Read timeout for IPC clients and the server's per-connection reads.
pub const IPC_TIMEOUT_MS: u64 = 2000;

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
