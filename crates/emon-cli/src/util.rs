//! Utility functions for CLI operations.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use dialoguer::{Input, Password, Select, theme::ColorfulTheme};
use indicatif::ProgressBar;

use emon_types::UserSummary;

use crate::style;

/// Whether prompts can be shown.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Spinner on stderr, only for interactive non-quiet runs.
pub fn spinner(message: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet || !io::stderr().is_terminal() {
        return None;
    }
    Some(style::loading_spinner(message))
}

/// Use `value` or prompt for it.
pub fn require_text(value: Option<String>, prompt: &str, flag: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    if !is_interactive() {
        bail!("No {prompt} given. Pass {flag} when not running in a terminal.");
    }
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()
        .context("Failed to read input")
}

/// Use `value` or prompt for it without echo.
pub fn require_password(value: Option<String>) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    if !is_interactive() {
        bail!("No password given. Pass --password or set EMON_PASSWORD when not running in a terminal.");
    }
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .interact()
        .context("Failed to read password")
}

/// Pick a user interactively.
pub fn select_user(users: &[UserSummary]) -> Result<i64> {
    if users.is_empty() {
        bail!("There are no users to assign the house to.");
    }
    if !is_interactive() {
        bail!("No owner given. Pass --user <ID>; run 'emon admin users' to list them.");
    }
    let items: Vec<String> = users
        .iter()
        .map(|u| format!("{} (#{})", u.username, u.id))
        .collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Assign to")
        .items(&items)
        .default(0)
        .interact()
        .context("Failed to get selection")?;
    Ok(users[selection].id)
}

/// Parse a threshold flag. `none` (or an empty value) clears the threshold.
pub fn parse_threshold<T: std::str::FromStr>(name: &str, value: &str) -> Result<Option<T>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match value.parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => bail!("Invalid {name} '{value}': expected a number or 'none'"),
    }
}

/// Write output to file or stdout
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold_values() {
        assert_eq!(parse_threshold::<f64>("power", "2500").unwrap(), Some(2500.0));
        assert_eq!(parse_threshold::<f64>("power", " 1.5 ").unwrap(), Some(1.5));
        assert_eq!(parse_threshold::<f64>("power", "none").unwrap(), None);
        assert_eq!(parse_threshold::<f64>("power", "").unwrap(), None);
        assert_eq!(parse_threshold::<u32>("offline", "60").unwrap(), Some(60));
    }

    #[test]
    fn test_parse_threshold_rejects_text() {
        let err = parse_threshold::<f64>("power", "lots").unwrap_err().to_string();
        assert!(err.contains("power"));
        assert!(err.contains("lots"));
        assert!(parse_threshold::<u32>("offline", "-1").is_err());
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_output(Some(&path), "hello\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
