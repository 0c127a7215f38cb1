//! Shared plumbing: the logger, constants and small helpers.

// Declared first so the logging macros are in scope for the rest of the crate
#[macro_use]
pub mod logger;

pub mod constants;
pub mod utils;
