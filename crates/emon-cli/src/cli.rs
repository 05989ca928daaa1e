//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use emon_types::{AlertFrequency, AlertSeverity, AlertStatus, AlertType};

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Visual styling mode for output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StyleMode {
    /// Standard styling with colors
    Minimal,
    /// Rich styling with tables and spinners (default)
    #[default]
    Rich,
    /// Plain text with no decorations (for scripting)
    Plain,
}

#[derive(Parser)]
#[command(name = "emon")]
#[command(author, version, about = "Client for the home energy monitoring server", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every command.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    /// Visual styling mode
    #[arg(long, global = true, value_enum, env = "EMON_STYLE")]
    pub style: Option<StyleMode>,

    /// API root (e.g. http://127.0.0.1:8000/api)
    #[arg(long, global = true, env = "EMON_API_URL")]
    pub api_url: Option<String>,

    /// Token endpoint (e.g. http://127.0.0.1:8000/api-token-auth/)
    #[arg(long, global = true, env = "EMON_AUTH_URL")]
    pub auth_url: Option<String>,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and keep the session token
    Login {
        /// Username (prompted if omitted)
        #[arg(short, long)]
        username: Option<String>,

        /// Password (prompted if omitted)
        #[arg(short, long, env = "EMON_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the session token
    Logout,

    /// Show the signed-in user and their settings
    Whoami,

    /// List your houses and their sensors
    Dashboard,

    /// Usage comparisons, prediction and rankings for a house
    House {
        /// House id
        id: i64,
    },

    /// Sensor details and recent history
    Sensor {
        /// Sensor id
        id: i64,

        /// Number of history points to show (0 for all)
        #[arg(short = 'n', long, default_value = "10")]
        points: usize,
    },

    /// Print live readings for a sensor until interrupted
    Watch {
        /// Sensor id
        id: i64,

        /// Stop after this many readings (0 for unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        count: u32,
    },

    /// Change a sensor's alert thresholds
    Thresholds(ThresholdArgs),

    /// List and manage alerts
    Alerts {
        #[command(flatten)]
        filter: AlertFilterArgs,

        #[command(subcommand)]
        action: Option<AlertsAction>,
    },

    /// Show or change your settings
    Settings(SettingsArgs),

    /// Admin area (staff only)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },

    /// Resolve a route and report where it leads
    Open {
        /// Route path, e.g. /admin/houses
        path: String,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Threshold fields; pass `none` to clear one.
#[derive(Debug, Clone, Args)]
pub struct ThresholdArgs {
    /// Sensor id
    pub id: i64,

    /// Power alert threshold in watts
    #[arg(long)]
    pub power: Option<String>,

    /// Maximum current in amperes
    #[arg(long)]
    pub current_max: Option<String>,

    /// Minimum voltage
    #[arg(long)]
    pub voltage_min: Option<String>,

    /// Maximum voltage
    #[arg(long)]
    pub voltage_max: Option<String>,

    /// Seconds without data before the sensor counts as offline
    #[arg(long)]
    pub offline_after: Option<String>,
}

/// Server-side alert filters; omitted means "all".
#[derive(Debug, Clone, Default, Args)]
pub struct AlertFilterArgs {
    /// Alert type (power_high, current_high, voltage_anomaly, sensor_offline, monthly_limit, anomaly)
    #[arg(long = "type")]
    pub alert_type: Option<AlertType>,

    /// Severity (info, warning, critical)
    #[arg(long)]
    pub severity: Option<AlertSeverity>,

    /// Status (unread, active, resolved)
    #[arg(long)]
    pub status: Option<AlertStatus>,
}

#[derive(Subcommand)]
pub enum AlertsAction {
    /// Mark an alert as read
    Read {
        /// Alert id
        id: i64,
    },

    /// Mark an alert as resolved
    Resolve {
        /// Alert id
        id: i64,
    },

    /// Create an alert by hand
    Create(AlertCreateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct AlertCreateArgs {
    /// House id
    #[arg(long)]
    pub house: i64,

    /// Sensor id
    #[arg(long)]
    pub sensor: Option<i64>,

    /// Alert type
    #[arg(long = "type")]
    pub alert_type: AlertType,

    /// Severity
    #[arg(long, default_value = "info")]
    pub severity: AlertSeverity,

    /// Message text
    #[arg(short, long)]
    pub message: String,

    /// Measured value
    #[arg(long)]
    pub value: Option<f64>,

    /// Threshold that was crossed
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Args)]
pub struct SettingsArgs {
    /// Live refresh interval in seconds
    #[arg(long)]
    pub refresh: Option<u32>,

    /// Send alert e-mails (true/false)
    #[arg(long)]
    pub email_alerts: Option<bool>,

    /// E-mail digest frequency (immediate, hourly, daily)
    #[arg(long)]
    pub frequency: Option<AlertFrequency>,
}

impl SettingsArgs {
    pub fn is_empty(&self) -> bool {
        self.refresh.is_none() && self.email_alerts.is_none() && self.frequency.is_none()
    }
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// Totals across all houses, sensors and users
    Dashboard,

    /// All houses with their owners
    Houses,

    /// All sensors
    Sensors,

    /// Users a house can be assigned to
    Users,

    /// Create a house and assign it to a user
    CreateHouse(CreateHouseArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CreateHouseArgs {
    /// Owner's user id (prompted from the user list if omitted)
    #[arg(long)]
    pub user: Option<i64>,

    /// House name
    #[arg(long)]
    pub name: String,

    /// Street address
    #[arg(long, default_value = "")]
    pub address: String,

    /// Price per kWh
    #[arg(long, default_value_t = emon_types::DEFAULT_PRICE_PER_KWH)]
    pub price: f64,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Key (api_url, auth_url, timeout, format, no_color)
        key: String,

        /// Value
        value: String,
    },

    /// Remove a configuration value
    Unset {
        /// Key to reset to its default
        key: String,
    },

    /// Show configuration file path
    Path,
}
