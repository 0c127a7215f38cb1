//! Control socket.
//!
//! The daemon exposes its [`CommandGateway`](crate::core::gateway::CommandGateway)
//! on a Unix socket so the CLI (or a GUI) can query and change the schedule
//! without touching the state file behind the daemon's back.

pub mod client;
pub mod protocol;
pub mod server;

use std::path::PathBuf;

use crate::common::constants::SOCKET_FILE_NAME;
use crate::common::utils::runtime_dir;

pub use client::send_request;
pub use protocol::{ErrorKind, Request, Response};
pub use server::IpcSocketServer;

/// `$XDG_RUNTIME_DIR/sunswitch.sock`, or `/run/user/<uid>/sunswitch.sock`.
pub fn socket_path() -> PathBuf {
    runtime_dir().join(SOCKET_FILE_NAME)
}
