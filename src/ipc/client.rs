//! Client side of the control protocol, used by the CLI.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use super::protocol::{Request, Response};
use crate::common::constants::IPC_TIMEOUT_MS;
use crate::common::utils::private_path;

/// Send `request` to the daemon listening on `socket_path` and wait for the answer.
pub fn send_request(socket_path: &Path, request: &Request) -> Result<Response> {
    let mut stream = UnixStream::connect(socket_path).with_context(|| {
        format!(
            "Failed to connect to {}. Is the sunswitch daemon running?",
            private_path(socket_path)
        )
    })?;

    let timeout = Some(Duration::from_millis(IPC_TIMEOUT_MS));
    stream
        .set_read_timeout(timeout)
        .context("Failed to set read timeout on IPC socket")?;
    stream
        .set_write_timeout(timeout)
        .context("Failed to set write timeout on IPC socket")?;

    let mut line = serde_json::to_string(request).context("Failed to serialize request")?;
    line.push('\n');
    stream
        .write_all(line.as_bytes())
        .and_then(|_| stream.flush())
        .context("Failed to send IPC request")?;

    let mut reader = BufReader::new(stream);
    let mut answer = String::new();
    reader
        .read_line(&mut answer)
        .context("Failed to read IPC response")?;

    if answer.trim().is_empty() {
        anyhow::bail!("Received empty response from the sunswitch daemon");
    }

    serde_json::from_str(answer.trim())
        .with_context(|| format!("Failed to parse IPC response: {}", answer.trim()))
}

/// Whether something is accepting connections on `socket_path`.
pub fn is_listening(socket_path: &Path) -> bool {
    UnixStream::connect(socket_path).is_ok()
}
