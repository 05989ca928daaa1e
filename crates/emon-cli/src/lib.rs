//! Command-line client for the home energy monitoring server.
//!
//! Every command is a navigation: the stored session is restored, the route
//! guard decides what may render, and only then is anything fetched. A
//! command that needs a session tells you to run `emon login`; an admin
//! command run by a regular user shows that user's dashboard instead.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `login` | Sign in and keep the session token |
//! | `logout` | Forget the session token |
//! | `whoami` | Show the signed-in user and settings |
//! | `dashboard` | Houses and their sensors |
//! | `house` | Usage comparisons, forecast and rankings for a house |
//! | `sensor` | Sensor details and recent history |
//! | `watch` | Live readings at the user's refresh interval |
//! | `thresholds` | Change a sensor's alert thresholds |
//! | `alerts` | Filtered alert list; `read`, `resolve`, `create` |
//! | `settings` | Show or change user settings |
//! | `admin` | Staff listings and house assignment |
//! | `open` | Report where a route leads for the current session |
//! | `config` | Manage CLI configuration |
//! | `completions` | Generate shell completions |
//!
//! # Configuration
//!
//! The CLI stores configuration in `~/.config/emon/config.toml` (or platform
//! equivalent; `EMON_CONFIG` overrides the location):
//!
//! - `api_url`: API root (default `http://127.0.0.1:8000/api`)
//! - `auth_url`: token endpoint (default `http://127.0.0.1:8000/api-token-auth/`)
//! - `timeout`: request timeout in seconds
//! - `format`: default output format (`text` or `json`)
//! - `no_color`: disable colored output
//!
//! # Environment Variables
//!
//! - `EMON_API_URL`, `EMON_AUTH_URL`: server endpoints (overridden by flags)
//! - `EMON_TOKEN_FILE`: where the session token is kept
//! - `EMON_PASSWORD`: password for `emon login`
//! - `NO_COLOR`: disable colored output when set
//!
//! # Examples
//!
//! ```bash
//! emon login -u alice
//! emon dashboard
//! emon watch 7 --count 10
//! emon alerts --status unread --severity critical
//! ```

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod format;
pub mod style;
pub mod util;

pub use emon_core;
pub use emon_types;
