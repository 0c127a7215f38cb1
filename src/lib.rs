//! Sunswitch library.
//!
//! Switches the desktop between a light and a dark theme at local sunrise and
//! sunset. The crate is split into:
//!
//! - [`geo`]: solar calculation and location providers
//! - [`core`]: the scheduler state machine, its gateway and the timer loop
//! - [`state`]: persistence of the scheduler record
//! - [`theme`]: the applier capability and its platform implementations
//! - [`config`]: the user's TOML settings
//! - [`ipc`], [`io`]: control socket, signals and the single-instance lock
//! - [`commands`], [`args`]: the CLI
//!
//! The binary entry point is in `main.rs`.

#[macro_use]
pub mod common;

pub mod args;
pub mod commands;
pub mod config;
pub mod core;
pub mod geo;
pub mod io;
pub mod ipc;
pub mod state;
pub mod theme;
pub mod time;

mod daemon;

pub use daemon::Sunswitch;
