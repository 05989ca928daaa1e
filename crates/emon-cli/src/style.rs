//! Visual styling utilities for the CLI.
//!
//! Spinners for requests in flight, table styles, and colour coding for
//! online state, alert severity and usage changes.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use emon_types::AlertSeverity;

use crate::cli::StyleMode;

// ============================================================================
// Spinners
// ============================================================================

/// Standard spinner tick characters (Braille dots animation)
const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

const SPINNER_TICK_MS: u64 = 80;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_TICK_CHARS)
}

/// Spinner shown while a view is loading.
pub fn loading_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    pb
}

// ============================================================================
// Tables
// ============================================================================

pub fn apply_table_style(table: &mut tabled::Table, style: StyleMode) {
    use tabled::settings::Style;
    match style {
        StyleMode::Rich | StyleMode::Minimal => {
            table.with(Style::rounded());
        }
        StyleMode::Plain => {
            table.with(Style::blank());
        }
    }
}

// ============================================================================
// Colored values
// ============================================================================

pub fn format_online(online: bool, no_color: bool) -> String {
    match (online, no_color) {
        (true, true) => "online".to_string(),
        (false, true) => "offline".to_string(),
        (true, false) => format!("{}", "online".green()),
        (false, false) => format!("{}", "offline".red()),
    }
}

pub fn format_severity(severity: AlertSeverity, no_color: bool) -> String {
    let text = severity.as_str();
    if no_color {
        return text.to_string();
    }
    match severity {
        AlertSeverity::Info => format!("{}", text.cyan()),
        AlertSeverity::Warning => format!("{}", text.yellow()),
        AlertSeverity::Critical => format!("{}", text.red().bold()),
        AlertSeverity::Other => format!("{}", text.dimmed()),
    }
}

/// Signed percentage; more consumption is red, less is green.
pub fn format_change(percent: f64, no_color: bool) -> String {
    let text = format!("{:+.1}%", percent);
    if no_color || percent == 0.0 {
        text
    } else if percent > 0.0 {
        format!("{}", text.red())
    } else {
        format!("{}", text.green())
    }
}

pub fn format_header(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("{}", text.bold())
    }
}

pub fn format_dim(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("{}", text.dimmed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_values_have_no_escape_codes() {
        assert_eq!(format_online(true, true), "online");
        assert_eq!(format_online(false, true), "offline");
        assert_eq!(format_severity(AlertSeverity::Critical, true), "critical");
        assert_eq!(format_change(12.34, true), "+12.3%");
        assert_eq!(format_change(-5.0, true), "-5.0%");
    }

    #[test]
    fn test_colored_values_keep_text() {
        let colored = format_online(false, false);
        assert!(colored.contains("offline"));
        assert!(colored.contains('\u{1b}'));
        assert_eq!(format_change(0.0, false), "+0.0%");
    }
}
