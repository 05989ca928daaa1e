//! `emon config` sub-commands.

use anyhow::{Context, Result};

use crate::cli::ConfigAction;
use crate::config::Config;

pub fn cmd_config(action: ConfigAction, json: bool) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", Config::path().display());
        }
        ConfigAction::Show => {
            let config = Config::load();
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
                println!("# {}", Config::path().display());
                print!("{}", content);
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load();
            config.set(&key, &value)?;
            config.save()?;
            eprintln!("Set {} = {}", key, value);
        }
        ConfigAction::Unset { key } => {
            let mut config = Config::load();
            config.unset(&key)?;
            config.save()?;
            eprintln!("Unset {}", key);
        }
    }
    Ok(())
}
