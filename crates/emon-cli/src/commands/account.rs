//! Sign-in, sign-out, profile and settings.

use anyhow::{Result, bail};
use serde_json::json;

use emon_core::{INVALID_CREDENTIALS, Session};
use emon_core::guard::View;
use emon_types::{UserProfile, UserSettings};

use crate::app::App;
use crate::cli::SettingsArgs;
use crate::format::{format_profile, format_settings};
use crate::util::{require_password, require_text};

use super::form_error;

const PROFILE_UNAVAILABLE: &str =
    "Sign-in succeeded but the profile could not be loaded; you are signed out. Please try again.";

/// The signed-in user once a login has settled.
///
/// `None` means the credentials were rejected. A failed profile fetch
/// leaves the session empty.
fn signed_in_user(session: Option<&Session>) -> Result<&UserProfile> {
    let Some(session) = session else {
        bail!("{}", INVALID_CREDENTIALS);
    };
    match session.user.as_ref() {
        Some(user) if session.is_authenticated() => Ok(user),
        _ => bail!("{}", PROFILE_UNAVAILABLE),
    }
}

pub async fn cmd_login(app: &App, username: Option<String>, password: Option<String>) -> Result<()> {
    // The login view renders for every session.
    app.enter(View::Login).await?;

    let username = require_text(username, "Username", "--username")?;
    let password = require_password(password)?;

    let pb = app.spinner("Signing in...");
    let accepted = app.session().login(&username, &password).await;
    let session = if accepted {
        Some(app.session().wait_settled().await)
    } else {
        None
    };
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let user = signed_in_user(session.as_ref())?;

    if app.is_json() {
        return app.emit_json(user);
    }
    let role = if user.is_staff { " (admin)" } else { "" };
    app.emit(&format!("Signed in as {}{}\n", user.username, role))
}

/// Safe to run when already signed out.
pub fn cmd_logout(app: &App) -> Result<()> {
    app.session().logout();
    app.note("Signed out.");
    Ok(())
}

pub async fn cmd_whoami(app: &App) -> Result<()> {
    let entry = app.enter(View::Settings).await?;
    let Some(user) = entry.session.user.as_ref() else {
        bail!("Not signed in. Run 'emon login' first.");
    };

    if app.is_json() {
        return app.emit_json(&json!({
            "user": user,
            "settings": entry.session.settings,
        }));
    }
    app.emit(&format_profile(
        user,
        entry.session.settings.as_ref(),
        &app.opts,
    ))
}

/// Apply the given flags to a copy of `current`.
fn edited(current: &UserSettings, args: &SettingsArgs) -> UserSettings {
    let mut next = current.clone();
    if let Some(secs) = args.refresh {
        next.live_refresh_interval_secs = secs;
    }
    if let Some(enabled) = args.email_alerts {
        next.email_alerts_enabled = enabled;
    }
    if let Some(frequency) = args.frequency {
        next.alert_frequency = frequency;
    }
    next
}

pub async fn cmd_settings(app: &App, args: SettingsArgs) -> Result<()> {
    let entry = app.enter(View::Settings).await?;
    let Some(current) = entry.session.settings.as_ref() else {
        bail!("No settings are stored for this account.");
    };

    if args.is_empty() {
        if app.is_json() {
            return app.emit_json(current);
        }
        return app.emit(&format_settings(current));
    }

    let pb = app.spinner("Saving settings...");
    let result = app.session().save_settings(&edited(current, &args)).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let saved = result.map_err(form_error)?;

    if app.is_json() {
        return app.emit_json(&saved);
    }
    app.note("Settings saved.");
    app.emit(&format_settings(&saved))
}
