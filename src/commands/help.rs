//! `--help` output and the `help [command]` dispatcher.

/// Full usage: options and commands.
pub fn display_help() {
    log_version!();
    log_block_start!("Usage: sunswitch [OPTIONS] [COMMAND]");
    log_block_start!("Switches the desktop between light and dark at sunrise and sunset");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>  Use a custom settings directory");
    log_indented!("-d, --debug         Show detailed scheduling and applier output");
    log_indented!("    --log <file>    Also write the log to a file");
    log_indented!("-h, --help          Print help information");
    log_indented!("-V, --version       Print version information");
    display_command_list();
    log_pipe!();
    log_info!("Use 'sunswitch help <command>' for details on a command.");
    log_end!();
}

fn display_command_list() {
    log_block_start!("Commands:");
    log_indented!("run                  Run the daemon (default)");
    log_indented!("get [--json]         Show the current state");
    log_indented!("theme <light|dark>   Choose a theme and turn automatic switching off");
    log_indented!("auto <on|off>        Follow sunrise and sunset, or stop following");
    log_indented!("geo <lat> <lon>      Set your location");
    log_indented!("times [YYYY-MM-DD]   Show sunrise and sunset");
    log_indented!("stop                 Terminate the running daemon");
    log_indented!("help [command]       Show help for a command");
}

/// Help for a single command, or the general help.
pub fn run_help_command(command: Option<&str>) {
    match command {
        None => display_help(),
        Some("get") => super::get::display_help(),
        Some("theme") => super::theme::display_help(),
        Some("auto") => super::auto::display_help(),
        Some("geo") => super::geo::display_help(),
        Some("times") => super::times::display_help(),
        Some("stop") => super::stop::display_help(),
        Some("run") => display_run_help(),
        Some(unknown) => {
            log_version!();
            log_pipe!();
            log_warning!("Unknown command: {unknown}");
            display_command_list();
            log_end!();
        }
    }
}

fn display_run_help() {
    log_version!();
    log_block_start!("run - Run the daemon");
    log_block_start!("Usage: sunswitch [run]");
    log_block_start!("Description:");
    log_indented!("Applies the theme for the current time, then switches at every");
    log_indented!("sunrise and sunset until stopped. Only one daemon runs at a time.");
    log_block_start!("Signals:");
    log_indented!("SIGTERM, SIGINT, SIGHUP  Shut down");
    log_indented!("SIGUSR2                  Reload settings and re-check the schedule");
    log_end!();
}
