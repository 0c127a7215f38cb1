//! `sunswitch theme <light|dark>`: manual override.

use anyhow::Result;

use super::{execute, log_outcome};
use crate::ipc::Request;
use crate::theme::Theme;

/// Apply `theme` now and switch to manual mode.
pub fn handle_theme_command(theme: Theme, debug_enabled: bool) -> Result<()> {
    log_version!();
    log_block_start!("Switching to {theme} theme");

    let (view, target) = execute(Request::ChangeTheme { theme }, debug_enabled)?;
    log_outcome(&view, target);
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("theme - Choose a theme by hand");
    log_block_start!("Usage: sunswitch theme <light|dark>");
    log_block_start!("Description:");
    log_indented!("Applies the theme immediately and turns automatic switching off.");
    log_indented!("Use 'sunswitch auto on' to go back to following the sun.");
    log_block_start!("Examples:");
    log_indented!("sunswitch theme dark");
    log_end!();
}
