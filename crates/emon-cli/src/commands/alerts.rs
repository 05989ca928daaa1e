//! Alert list, actions, and hand-made alerts.

use anyhow::Result;

use emon_core::guard::View;
use emon_core::views::AlertBoard;
use emon_types::{AlertFilter, NewAlert};

use crate::app::App;
use crate::cli::{AlertCreateArgs, AlertFilterArgs, AlertsAction};
use crate::format::format_alerts;

use super::{form_error, ready};

impl From<&AlertFilterArgs> for AlertFilter {
    fn from(args: &AlertFilterArgs) -> Self {
        AlertFilter::all()
            .with_type(args.alert_type)
            .with_severity(args.severity)
            .with_status(args.status)
    }
}

pub async fn cmd_alerts(
    app: &App,
    filter: AlertFilterArgs,
    action: Option<AlertsAction>,
) -> Result<()> {
    match action {
        None => list(app, AlertFilter::from(&filter)).await,
        Some(AlertsAction::Read { id }) => {
            let entry = app.enter(View::Alerts).await?;
            AlertBoard::new(entry.api).mark_read(id).await?;
            app.note(&format!("Alert #{id} marked as read."));
            Ok(())
        }
        Some(AlertsAction::Resolve { id }) => {
            let entry = app.enter(View::Alerts).await?;
            AlertBoard::new(entry.api).mark_resolved(id).await?;
            app.note(&format!("Alert #{id} resolved."));
            Ok(())
        }
        Some(AlertsAction::Create(args)) => create(app, args).await,
    }
}

async fn list(app: &App, filter: AlertFilter) -> Result<()> {
    let entry = app.enter(View::Alerts).await?;
    let mut board = AlertBoard::new(entry.api);

    let pb = app.spinner("Loading alerts...");
    board.set_filter(filter).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let unread = board.unread_count();
    let alerts = ready(board.alerts().clone())?;
    if app.is_json() {
        return app.emit_json(&alerts);
    }
    app.emit(&format_alerts(&alerts, &app.opts))?;
    if unread > 0 {
        app.note(&format!("{unread} unread"));
    }
    Ok(())
}

async fn create(app: &App, args: AlertCreateArgs) -> Result<()> {
    let entry = app.enter(View::AlertCreate).await?;
    let alert = NewAlert {
        house: args.house,
        sensor: args.sensor,
        alert_type: args.alert_type,
        severity: args.severity,
        message: args.message,
        value: args.value,
        threshold: args.threshold,
    };
    let created = entry.api.create_alert(&alert).await.map_err(form_error)?;

    if app.is_json() {
        return app.emit_json(&created);
    }
    app.emit(&format!("Created alert #{}\n", created.id))
}
