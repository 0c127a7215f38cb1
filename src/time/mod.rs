//! Time handling: the clock abstraction used by the scheduler and the logger.

pub mod source;
