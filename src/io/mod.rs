//! Process-level I/O: the single-instance lock and signal handling.

pub mod lock;
pub mod signals;
