use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use emon_cli::app::App;
use emon_cli::cli::{Cli, Commands};
use emon_cli::commands::{
    cmd_admin, cmd_alerts, cmd_config, cmd_dashboard, cmd_house, cmd_login, cmd_logout, cmd_open,
    cmd_sensor, cmd_settings, cmd_thresholds, cmd_watch, cmd_whoami,
};
use emon_cli::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "emon", &mut io::stdout());
        return Ok(());
    }

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.global.quiet {
        EnvFilter::new("warn")
    } else if cli.global.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Commands::Config { action } = cli.command {
        return cmd_config(action, cli.global.json);
    }

    let config = Config::load();
    let app = App::new(&cli.global, &config)?;

    match cli.command {
        Commands::Login { username, password } => cmd_login(&app, username, password).await,
        Commands::Logout => cmd_logout(&app),
        Commands::Whoami => cmd_whoami(&app).await,
        Commands::Dashboard => cmd_dashboard(&app).await,
        Commands::House { id } => cmd_house(&app, id).await,
        Commands::Sensor { id, points } => cmd_sensor(&app, id, points).await,
        Commands::Watch { id, count } => cmd_watch(&app, id, count).await,
        Commands::Thresholds(args) => cmd_thresholds(&app, args).await,
        Commands::Alerts { filter, action } => cmd_alerts(&app, filter, action).await,
        Commands::Settings(args) => cmd_settings(&app, args).await,
        Commands::Admin { action } => cmd_admin(&app, action).await,
        Commands::Open { path } => cmd_open(&app, &path).await,
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}
