//! Command-line argument parsing.
//!
//! Hand-rolled: global flags may appear anywhere, the first positional word is
//! the command and the rest are its arguments. A word starting with `-` that
//! parses as a number is a positional (`sunswitch geo -33.9 151.2`).

use chrono::NaiveDate;

use crate::theme::Theme;

/// Flags accepted by every command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalFlags {
    pub debug_enabled: bool,
    pub config_dir: Option<String>,
    pub log_file: Option<String>,
}

/// What the process was asked to do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon in the foreground
    Run,
    /// Print the current state
    Get { json: bool },
    /// Pick a theme by hand; turns automatic switching off
    Theme { theme: Theme },
    /// Turn automatic switching on or off
    Auto { enabled: bool },
    /// Store a new coordinate
    Geo { latitude: f64, longitude: f64 },
    /// Print sunrise and sunset for a date (today when absent)
    Times { date: Option<NaiveDate> },
    /// Terminate the running daemon
    Stop,
    /// `help [command]`
    Help { command: Option<String> },
    ShowHelp,
    ShowVersion,
    /// Bad arguments; show help and exit non-zero
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
#[derive(Debug, PartialEq)]
pub struct ParsedArgs {
    pub action: CliAction,
    pub flags: GlobalFlags,
}

fn is_number(arg: &str) -> bool {
    arg.parse::<f64>().is_ok()
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn parse_theme(value: &str) -> Option<Theme> {
    match value.to_ascii_lowercase().as_str() {
        "light" => Some(Theme::Light),
        "dark" => Some(Theme::Dark),
        _ => None,
    }
}

impl ParsedArgs {
    /// Parse `args`, including the program name in first position.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut flags = GlobalFlags::default();
        let mut display_help = false;
        let mut display_version = false;
        let mut json = false;
        let mut bad_args = false;
        let mut positionals: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = &args_vec[i];
            match arg.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" => display_version = true,
                "--debug" | "-d" => flags.debug_enabled = true,
                "--json" => json = true,
                "--config" | "-c" | "--log" => {
                    match args_vec.get(i + 1).filter(|next| !next.starts_with('-')) {
                        Some(value) => {
                            if arg == "--log" {
                                flags.log_file = Some(value.clone());
                            } else {
                                flags.config_dir = Some(value.clone());
                            }
                            i += 1;
                        }
                        None => {
                            log_warning!("Missing value for {arg}");
                            bad_args = true;
                        }
                    }
                }
                _ if arg.starts_with('-') && !is_number(arg) => {
                    log_warning!("Unknown argument: {arg}");
                    bad_args = true;
                }
                _ => positionals.push(arg.clone()),
            }
            i += 1;
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if bad_args {
            CliAction::ShowHelpDueToError
        } else {
            Self::parse_command(&positionals, json)
        };

        ParsedArgs { action, flags }
    }

    fn parse_command(positionals: &[String], json: bool) -> CliAction {
        let Some((command, rest)) = positionals.split_first() else {
            return if json {
                log_warning!("--json only applies to 'sunswitch get'");
                CliAction::ShowHelpDueToError
            } else {
                CliAction::Run
            };
        };

        if json && command != "get" {
            log_warning!("--json only applies to 'sunswitch get'");
            return CliAction::ShowHelpDueToError;
        }

        let expected = match command.as_str() {
            "run" | "get" | "stop" => 0,
            "theme" | "auto" => 1,
            "geo" => 2,
            "times" | "help" => rest.len().min(1),
            _ => {
                log_warning!("Unknown command: {command}");
                return CliAction::ShowHelpDueToError;
            }
        };
        if rest.len() != expected {
            log_warning!(
                "'{command}' takes {expected} argument(s), got {}",
                rest.len()
            );
            return CliAction::ShowHelpDueToError;
        }

        match command.as_str() {
            "run" => CliAction::Run,
            "get" => CliAction::Get { json },
            "stop" => CliAction::Stop,
            "theme" => match parse_theme(&rest[0]) {
                Some(theme) => CliAction::Theme { theme },
                None => {
                    log_warning!("Unknown theme '{}'. Usage: sunswitch theme <light|dark>", rest[0]);
                    CliAction::ShowHelpDueToError
                }
            },
            "auto" => match parse_on_off(&rest[0]) {
                Some(enabled) => CliAction::Auto { enabled },
                None => {
                    log_warning!("Expected on or off, got '{}'", rest[0]);
                    CliAction::ShowHelpDueToError
                }
            },
            "geo" => match (rest[0].parse::<f64>(), rest[1].parse::<f64>()) {
                (Ok(latitude), Ok(longitude)) => CliAction::Geo {
                    latitude,
                    longitude,
                },
                _ => {
                    log_warning!("Invalid coordinate. Usage: sunswitch geo <latitude> <longitude>");
                    CliAction::ShowHelpDueToError
                }
            },
            "times" => match rest.first() {
                None => CliAction::Times { date: None },
                Some(value) => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                    Ok(date) => CliAction::Times { date: Some(date) },
                    Err(_) => {
                        log_warning!("Invalid date '{value}'. Expected YYYY-MM-DD");
                        CliAction::ShowHelpDueToError
                    }
                },
            },
            _ => CliAction::Help {
                command: rest.first().cloned(),
            },
        }
    }
}
