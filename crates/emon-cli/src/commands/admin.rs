//! Admin area. Non-staff users land on their dashboard instead.

use anyhow::Result;
use serde_json::json;

use emon_core::guard::View;
use emon_core::views::{assignable_users, load_admin_overview};
use emon_types::NewHouse;

use crate::app::{App, Entry};
use crate::cli::{AdminAction, CreateHouseArgs};
use crate::format::{format_admin_houses, format_admin_overview, format_sensors, format_users};
use crate::util::select_user;

use super::{dashboard, form_error, ready};

fn target(action: &AdminAction) -> View {
    match action {
        AdminAction::Dashboard => View::AdminDashboard,
        AdminAction::Sensors => View::AdminSensors,
        AdminAction::Houses | AdminAction::Users | AdminAction::CreateHouse(_) => View::AdminHouses,
    }
}

pub async fn cmd_admin(app: &App, action: AdminAction) -> Result<()> {
    let view = target(&action);
    let entry = app.enter(view).await?;
    if entry.view != view {
        return dashboard::render(app, &entry).await;
    }

    match action {
        AdminAction::Dashboard => overview(app, &entry).await,
        AdminAction::Houses => {
            let houses = entry.api.admin_houses().await?;
            if app.is_json() {
                return app.emit_json(&houses);
            }
            app.emit(&format_admin_houses(&houses, &app.opts))
        }
        AdminAction::Sensors => {
            let sensors = entry.api.admin_sensors().await?;
            if app.is_json() {
                return app.emit_json(&sensors);
            }
            app.emit(&format_sensors(&sensors, &app.opts))
        }
        AdminAction::Users => {
            let users = assignable_users(&entry.api).await?;
            if app.is_json() {
                return app.emit_json(&users);
            }
            app.emit(&format_users(&users, &app.opts))
        }
        AdminAction::CreateHouse(args) => create_house(app, &entry, args).await,
    }
}

async fn overview(app: &App, entry: &Entry) -> Result<()> {
    let pb = app.spinner("Loading overview...");
    let state = load_admin_overview(&entry.api).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let overview = ready(state)?;

    if app.is_json() {
        return app.emit_json(&json!({
            "houses": overview.houses.len(),
            "sensors": overview.sensors.len(),
            "online_sensors": overview.online_sensors(),
            "offline_sensors": overview.offline_sensors(),
            "users": overview.users.len(),
        }));
    }
    app.emit(&format_admin_overview(&overview, &app.opts))
}

async fn create_house(app: &App, entry: &Entry, args: CreateHouseArgs) -> Result<()> {
    let user = match args.user {
        Some(user) => user,
        None => select_user(&assignable_users(&entry.api).await?)?,
    };
    let house = NewHouse {
        user,
        name: args.name,
        address: args.address,
        price_per_kwh: args.price,
    };
    let created = entry.api.create_house(&house).await.map_err(form_error)?;

    if app.is_json() {
        return app.emit_json(&created);
    }
    let owner = created
        .user
        .as_ref()
        .map(|u| u.username.clone())
        .unwrap_or_else(|| format!("user #{user}"));
    app.emit(&format!(
        "Created house #{} '{}' for {}\n",
        created.id, created.name, owner
    ))
}
