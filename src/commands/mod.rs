//! One-shot CLI commands.
//!
//! Commands that read or change the schedule talk to the running daemon over
//! the control socket. When no daemon is listening, changes build a short-lived
//! [`CommandGateway`] on the persisted state and run the same request
//! in-process, so both paths share [`handle_request`]. A local `get` only reads
//! the state file.

pub mod auto;
pub mod geo;
pub mod get;
pub mod help;
pub mod stop;
pub mod theme;
pub mod times;

use anyhow::Result;
use std::fmt;

use crate::config;
use crate::core::Scheduler;
use crate::core::gateway::{CommandGateway, ConfigView};
use crate::geo::location::{LocationProvider, SettingsLocationProvider};
use crate::ipc::protocol::handle_request;
use crate::ipc::{self, ErrorKind, Request, Response};
use crate::state::ScheduleStore;
use crate::theme::applier::{create_applier, detect_applier};
use crate::time;

/// A request was understood but refused, by the daemon or in-process.
#[derive(Debug)]
pub struct RequestFailed {
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for RequestFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl std::error::Error for RequestFailed {}

/// Where a command was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Daemon,
    Local,
}

fn into_result(response: Response) -> Result<ConfigView> {
    match response {
        Response::Ok { config } => Ok(config),
        Response::Error { kind, message } => Err(RequestFailed { kind, message }.into()),
    }
}

/// Run `request` against the daemon if one is listening, in-process otherwise.
pub(crate) fn execute(request: Request, debug_enabled: bool) -> Result<(ConfigView, Target)> {
    let socket = ipc::socket_path();
    if ipc::client::is_listening(&socket) {
        if debug_enabled {
            log_pipe!();
            log_debug!("Sending {request:?} to the running daemon");
        }
        let response = ipc::send_request(&socket, &request)?;
        return Ok((into_result(response)?, Target::Daemon));
    }

    let store = ScheduleStore::for_default_location()?;
    Ok((run_local(request, store, debug_enabled)?, Target::Local))
}

/// Run `request` in-process on the persisted state.
///
/// `get_config` only reads the state file; it never builds an applier or
/// picks up a changed location.
fn run_local(request: Request, store: ScheduleStore, debug_enabled: bool) -> Result<ConfigView> {
    if request == Request::GetConfig {
        return Ok(ConfigView::new(&store.load_or_default(), None));
    }
    let gateway = local_gateway(store, debug_enabled)?;
    into_result(handle_request(&gateway, request))
}

/// A gateway over the persisted state, with the configured applier and location.
fn local_gateway(store: ScheduleStore, debug_enabled: bool) -> Result<CommandGateway> {
    let settings = config::load()?;
    let applier = create_applier(detect_applier(&settings), &settings, debug_enabled)?;
    let scheduler = Scheduler::new(store, applier, time::source::global(), debug_enabled);
    let gateway = CommandGateway::new(scheduler);

    let provider = SettingsLocationProvider::new(config::get_config_path()?);
    if let Ok(coordinate) = provider.current()
        && let Err(e) = gateway.change_location(coordinate)
        && debug_enabled
    {
        log_debug!("Location from settings not saved: {e}");
    }
    Ok(gateway)
}

/// Short report after a change, in the block style.
pub(crate) fn log_outcome(view: &ConfigView, target: Target) {
    match target {
        Target::Daemon => log_decorated!("Applied by the running daemon"),
        Target::Local => log_decorated!("No daemon running, state file updated"),
    }
    log_indented!(
        "Mode: {}",
        if view.automatic_switching {
            "automatic"
        } else {
            "manual"
        }
    );
    log_indented!("Theme: {}", view.last_theme);
    if let Some(ref next) = view.next_event {
        log_indented!(
            "Next: {} at {}{}",
            next.target,
            crate::geo::display::format_instant(next.fire_at),
            if next.provisional { " (estimated)" } else { "" }
        );
    }
}
