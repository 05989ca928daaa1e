//! Command implementations.

mod account;
mod admin;
mod alerts;
mod config;
mod dashboard;
mod open;
mod sensor;

pub use account::{cmd_login, cmd_logout, cmd_settings, cmd_whoami};
pub use admin::cmd_admin;
pub use alerts::cmd_alerts;
pub use config::cmd_config;
pub use dashboard::{cmd_dashboard, cmd_house};
pub use open::cmd_open;
pub use sensor::{cmd_sensor, cmd_thresholds, cmd_watch};

use anyhow::{Result, anyhow};

use emon_core::views::ViewState;

/// Unwrap a loaded view; a failed load becomes the command's error.
fn ready<T>(state: ViewState<T>) -> Result<T> {
    match state {
        ViewState::Ready(value) => Ok(value),
        ViewState::Failed(message) => Err(anyhow!(message)),
        ViewState::Loading => Err(anyhow!("view did not finish loading")),
    }
}

/// Error for a rejected form: the server's own message when it sent one.
fn form_error(e: emon_core::Error) -> anyhow::Error {
    anyhow!(e.user_message())
}
