//! Binary entry point: parse arguments and dispatch.

use anyhow::Result;
use std::sync::Arc;
use sunswitch::args::{CliAction, ParsedArgs};
use sunswitch::commands::{self, RequestFailed};
use sunswitch::common::constants::EXIT_FAILURE;
use sunswitch::common::logger::Log;
use sunswitch::ipc::ErrorKind;
use sunswitch::time::{self, source::RealTimeSource};
use sunswitch::{Sunswitch, config, log_end, log_error_exit, log_indented};

fn main() -> Result<()> {
    time::source::init_time_source(Arc::new(RealTimeSource));

    let parsed = ParsedArgs::parse(std::env::args());
    let flags = parsed.flags;
    let debug_enabled = flags.debug_enabled;

    if flags.config_dir.is_some() {
        config::set_config_dir(flags.config_dir.clone())?;
    }

    let _log_guard = match flags.log_file {
        Some(path) => Some(Log::start_file_logging(path)?),
        None => None,
    };

    let result = match parsed.action {
        CliAction::Run => Sunswitch::new(debug_enabled).run(),
        CliAction::Get { json } => commands::get::handle_get_command(json, debug_enabled),
        CliAction::Theme { theme } => commands::theme::handle_theme_command(theme, debug_enabled),
        CliAction::Auto { enabled } => commands::auto::handle_auto_command(enabled, debug_enabled),
        CliAction::Geo {
            latitude,
            longitude,
        } => commands::geo::handle_geo_command(latitude, longitude, debug_enabled),
        CliAction::Times { date } => commands::times::handle_times_command(date),
        CliAction::Stop => commands::stop::handle_stop_command(debug_enabled),
        CliAction::Help { command } => {
            commands::help::run_help_command(command.as_deref());
            Ok(())
        }
        CliAction::ShowHelp => {
            commands::help::display_help();
            Ok(())
        }
        CliAction::ShowVersion => {
            println!("sunswitch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            commands::help::display_help();
            std::process::exit(EXIT_FAILURE);
        }
    };

    if let Err(e) = result {
        Log::set_enabled(true);
        report_error(&e);
        drop(_log_guard);
        std::process::exit(EXIT_FAILURE);
    }
    Ok(())
}

/// Print a failed command with a hint for the errors users can act on.
fn report_error(error: &anyhow::Error) {
    match error.downcast_ref::<RequestFailed>() {
        Some(failed) => {
            log_error_exit!("{}", failed.message);
            match failed.kind {
                ErrorKind::Persistence => {
                    log_indented!("The change took effect but could not be saved")
                }
                ErrorKind::CorruptState => {
                    log_indented!("The state file is unreadable and was reset to defaults")
                }
                ErrorKind::InvalidRequest => {}
            }
        }
        None => {
            log_error_exit!("{error}");
            for cause in error.chain().skip(1) {
                log_indented!("{cause}");
            }
        }
    }
    log_end!();
}
