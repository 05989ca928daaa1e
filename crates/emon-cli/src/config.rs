//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use emon_core::{DEFAULT_API_URL, DEFAULT_AUTH_URL, DEFAULT_TIMEOUT};

use crate::cli::{GlobalArgs, OutputFormat, StyleMode};

/// Environment variable that overrides the config file location.
pub const CONFIG_FILE_ENV: &str = "EMON_CONFIG";

/// Keys accepted by `emon config set`.
pub const KEYS: &[&str] = &["api_url", "auth_url", "timeout", "format", "no_color"];

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API root
    #[serde(default)]
    pub api_url: Option<String>,

    /// Token endpoint
    #[serde(default)]
    pub auth_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Default output format ("text" or "json")
    #[serde(default)]
    pub format: Option<String>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_FILE_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("emon")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`; a missing or unreadable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Set one key from its textual value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_url" => self.api_url = Some(require_http(key, value)?),
            "auth_url" => self.auth_url = Some(require_http(key, value)?),
            "timeout" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("timeout must be a whole number of seconds, got '{value}'"))?;
                if secs == 0 {
                    bail!("timeout must be at least 1 second");
                }
                self.timeout = Some(secs);
            }
            "format" => match value {
                "text" | "json" => self.format = Some(value.to_string()),
                _ => bail!("format must be 'text' or 'json', got '{value}'"),
            },
            "no_color" => {
                self.no_color = value
                    .parse()
                    .with_context(|| format!("no_color must be true or false, got '{value}'"))?;
            }
            _ => bail!("Unknown key '{key}'. Valid keys: {}", KEYS.join(", ")),
        }
        Ok(())
    }

    /// Reset one key to its default.
    pub fn unset(&mut self, key: &str) -> Result<()> {
        match key {
            "api_url" => self.api_url = None,
            "auth_url" => self.auth_url = None,
            "timeout" => self.timeout = None,
            "format" => self.format = None,
            "no_color" => self.no_color = false,
            _ => bail!("Unknown key '{key}'. Valid keys: {}", KEYS.join(", ")),
        }
        Ok(())
    }
}

fn require_http(key: &str, value: &str) -> Result<String> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        bail!("{key} must start with http:// or https://");
    }
    Ok(value.to_string())
}

/// Server endpoints and timeout after flag, environment and config resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_url: String,
    pub auth_url: String,
    pub timeout: Duration,
}

/// Resolve endpoints: flag or environment (both arrive through clap), then
/// config, then the built-in default.
pub fn resolve_endpoints(global: &GlobalArgs, config: &Config) -> Endpoints {
    Endpoints {
        api_url: global
            .api_url
            .clone()
            .or_else(|| config.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        auth_url: global
            .auth_url
            .clone()
            .or_else(|| config.auth_url.clone())
            .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
        timeout: config
            .timeout
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT),
    }
}

/// `--json` wins; otherwise the configured format, else text.
pub fn resolve_format(json: bool, config: &Config) -> OutputFormat {
    if json || config.format.as_deref() == Some("json") {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}

pub fn resolve_style(style: Option<StyleMode>) -> StyleMode {
    style.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn global() -> GlobalArgs {
        GlobalArgs {
            verbose: false,
            quiet: false,
            json: false,
            compact: false,
            no_color: false,
            style: None,
            api_url: None,
            auth_url: None,
            output: None,
        }
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unparsable_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_url = [not toml").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_save_creates_directories_and_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("emon").join("config.toml");
        let mut config = Config::default();
        config.set("api_url", "https://energy.example/api").unwrap();
        config.set("timeout", "30").unwrap();
        config.set("no_color", "true").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.api_url.as_deref(), Some("https://energy.example/api"));
        assert_eq!(loaded.timeout, Some(30));
        assert!(loaded.no_color);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("api_url", "ftp://x").is_err());
        assert!(config.set("timeout", "0").is_err());
        assert!(config.set("timeout", "soon").is_err());
        assert!(config.set("format", "csv").is_err());
        let err = config.set("colour", "x").unwrap_err().to_string();
        assert!(err.contains("Valid keys"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unset_restores_default() {
        let mut config = Config::default();
        config.set("format", "json").unwrap();
        config.unset("format").unwrap();
        assert_eq!(config.format, None);
    }

    #[test]
    fn test_endpoint_precedence() {
        let config = Config {
            api_url: Some("http://from-config/api".to_string()),
            timeout: Some(3),
            ..Config::default()
        };

        let resolved = resolve_endpoints(&global(), &config);
        assert_eq!(resolved.api_url, "http://from-config/api");
        assert_eq!(resolved.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(resolved.timeout, Duration::from_secs(3));

        let flags = GlobalArgs {
            api_url: Some("http://from-flag/api".to_string()),
            ..global()
        };
        let resolved = resolve_endpoints(&flags, &config);
        assert_eq!(resolved.api_url, "http://from-flag/api");

        let resolved = resolve_endpoints(&global(), &Config::default());
        assert_eq!(resolved.api_url, DEFAULT_API_URL);
        assert_eq!(resolved.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_format_resolution() {
        let json_config = Config {
            format: Some("json".to_string()),
            ..Config::default()
        };
        assert_eq!(resolve_format(false, &Config::default()), OutputFormat::Text);
        assert_eq!(resolve_format(true, &Config::default()), OutputFormat::Json);
        assert_eq!(resolve_format(false, &json_config), OutputFormat::Json);
    }
}
