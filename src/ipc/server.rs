//! Unix socket server for the control protocol.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use super::protocol::handle_line;
use crate::common::constants::IPC_TIMEOUT_MS;
use crate::common::utils::private_path;
use crate::core::gateway::CommandGateway;

pub struct IpcSocketServer {
    socket_path: PathBuf,
    listener: UnixListener,
}

impl IpcSocketServer {
    /// Bind the socket, replacing a leftover socket file.
    pub fn new(socket_path: PathBuf) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(&socket_path).with_context(|| {
                format!(
                    "Failed to remove existing socket: {}",
                    private_path(&socket_path)
                )
            })?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create socket directory: {}", private_path(parent))
            })?;
        }

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {}", private_path(&socket_path)))?;

        // Polled so the running flag is honored
        listener
            .set_nonblocking(true)
            .context("Failed to set socket to non-blocking mode")?;

        Ok(Self {
            socket_path,
            listener,
        })
    }

    /// Serve requests until `running` is cleared.
    pub fn run(
        self,
        gateway: CommandGateway,
        running: Arc<AtomicBool>,
        debug_enabled: bool,
    ) -> Result<()> {
        if debug_enabled {
            log_pipe!();
            log_debug!("IPC server listening on {}", private_path(&self.socket_path));
        }

        while running.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, _addr)) => {
                    if let Err(e) = serve_client(stream, &gateway, debug_enabled)
                        && debug_enabled
                    {
                        log_pipe!();
                        log_debug!("IPC client error: {e:#}");
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    if debug_enabled {
                        log_pipe!();
                        log_debug!("Error accepting IPC connection: {e}");
                    }
                    thread::sleep(Duration::from_millis(50));
                }
            }
        }

        if debug_enabled {
            log_pipe!();
            log_debug!("IPC server shutting down");
        }
        Ok(())
    }
}

impl Drop for IpcSocketServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Read one request line and answer it.
fn serve_client(stream: UnixStream, gateway: &CommandGateway, debug_enabled: bool) -> Result<()> {
    let timeout = Some(Duration::from_millis(IPC_TIMEOUT_MS));
    stream
        .set_nonblocking(false)
        .context("Failed to set client stream to blocking mode")?;
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;

    let mut reader = BufReader::new(stream.try_clone().context("Failed to clone stream")?);
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read IPC request")?;

    if debug_enabled {
        log_pipe!();
        log_debug!("IPC request: {}", line.trim());
    }

    let response = handle_line(gateway, &line);
    let mut json = serde_json::to_string(&response).context("Failed to serialize response")?;
    json.push('\n');

    let mut writer = stream;
    writer
        .write_all(json.as_bytes())
        .and_then(|_| writer.flush())
        .context("Failed to write IPC response")
}
