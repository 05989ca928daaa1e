//! Dashboard and house detail.

use anyhow::Result;
use serde_json::json;

use emon_core::guard::View;
use emon_core::views::{load_dashboard, load_house_view};

use crate::app::{App, Entry};
use crate::format::{format_house_view, format_houses};

use super::ready;

pub async fn cmd_dashboard(app: &App) -> Result<()> {
    let entry = app.enter(View::Dashboard).await?;
    render(app, &entry).await
}

/// Render the dashboard for an entry that already passed the guard.
pub(crate) async fn render(app: &App, entry: &Entry) -> Result<()> {
    let pb = app.spinner("Loading houses...");
    let state = load_dashboard(&entry.api).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let houses = ready(state)?;

    if app.is_json() {
        return app.emit_json(&houses);
    }
    app.emit(&format_houses(&houses, &app.opts))
}

pub async fn cmd_house(app: &App, id: i64) -> Result<()> {
    let entry = app.enter(View::HouseDetail(id)).await?;

    let pb = app.spinner("Loading house...");
    let state = load_house_view(&entry.api, id).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let view = ready(state)?;

    if app.is_json() {
        return app.emit_json(&json!({
            "house": view.house,
            "statistics": view.statistics,
        }));
    }
    app.emit(&format_house_view(&view, &app.opts))
}
