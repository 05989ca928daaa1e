//! Sensor detail, threshold edits, and live watching.

use std::fs::File;
use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use serde_json::json;

use emon_core::guard::View;
use emon_core::interval_for;
use emon_core::views::{SensorMonitor, load_sensor_view};
use emon_types::SensorThresholds;

use crate::app::App;
use crate::cli::ThresholdArgs;
use crate::format::{format_live_line, format_sensor_view, format_thresholds};
use crate::util::parse_threshold;

use super::{form_error, ready};

pub async fn cmd_sensor(app: &App, id: i64, points: usize) -> Result<()> {
    let entry = app.enter(View::SensorDetail(id)).await?;

    let pb = app.spinner("Loading sensor...");
    let state = load_sensor_view(&entry.api, id).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let view = ready(state)?;

    if app.is_json() {
        return app.emit_json(&json!({
            "sensor": view.sensor,
            "history": view.history,
        }));
    }
    app.emit(&format_sensor_view(&view, points, &app.opts))
}

// ============================================================================
// Thresholds
// ============================================================================

/// Parsed threshold flags. The outer `Option` is "flag given", the inner
/// one is the new value (`None` clears it).
#[derive(Debug, Default, PartialEq)]
struct ThresholdChanges {
    power: Option<Option<f64>>,
    current_max: Option<Option<f64>>,
    voltage_min: Option<Option<f64>>,
    voltage_max: Option<Option<f64>>,
    offline_after: Option<Option<u32>>,
}

impl ThresholdChanges {
    fn from_args(args: &ThresholdArgs) -> Result<Self> {
        fn field<T: std::str::FromStr>(name: &str, raw: &Option<String>) -> Result<Option<Option<T>>> {
            raw.as_deref().map(|v| parse_threshold(name, v)).transpose()
        }
        Ok(Self {
            power: field("--power", &args.power)?,
            current_max: field("--current-max", &args.current_max)?,
            voltage_min: field("--voltage-min", &args.voltage_min)?,
            voltage_max: field("--voltage-max", &args.voltage_max)?,
            offline_after: field("--offline-after", &args.offline_after)?,
        })
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(&self, mut thresholds: SensorThresholds) -> SensorThresholds {
        if let Some(v) = self.power {
            thresholds.power_threshold = v;
        }
        if let Some(v) = self.current_max {
            thresholds.current_max_threshold = v;
        }
        if let Some(v) = self.voltage_min {
            thresholds.voltage_min_threshold = v;
        }
        if let Some(v) = self.voltage_max {
            thresholds.voltage_max_threshold = v;
        }
        if let Some(v) = self.offline_after {
            thresholds.offline_threshold_seconds = v;
        }
        thresholds
    }
}

pub async fn cmd_thresholds(app: &App, args: ThresholdArgs) -> Result<()> {
    let changes = ThresholdChanges::from_args(&args)?;
    if changes.is_empty() {
        bail!(
            "Nothing to change. Pass at least one of --power, --current-max, \
             --voltage-min, --voltage-max, --offline-after."
        );
    }

    let entry = app.enter(View::SensorDetail(args.id)).await?;
    let sensor = entry
        .api
        .sensor(args.id)
        .await
        .with_context(|| format!("Failed to load sensor #{}", args.id))?;

    let thresholds = changes.apply(SensorThresholds::from_sensor(&sensor));
    let updated = entry
        .api
        .update_thresholds(args.id, &thresholds)
        .await
        .map_err(form_error)?;

    if app.is_json() {
        return app.emit_json(&updated);
    }
    app.note(&format!("Thresholds updated for {}.", updated.name));
    app.emit(&format_thresholds(&SensorThresholds::from_sensor(&updated)))
}

// ============================================================================
// Watch
// ============================================================================

pub async fn cmd_watch(app: &App, id: i64, count: u32) -> Result<()> {
    let entry = app.enter(View::SensorDetail(id)).await?;

    let mut sink: Box<dyn Write> = match &app.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    let mut monitor = SensorMonitor::new(entry.api.clone(), id);
    let mut readings = monitor.subscribe();
    monitor.apply_settings(entry.session.settings.as_ref());

    let interval = interval_for(entry.session.settings.as_ref());
    app.note(&format!(
        "Watching sensor #{} every {} s (Ctrl+C to stop)",
        id,
        interval.as_secs_f64()
    ));

    let mut seen: u32 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                app.note("\nStopped.");
                break;
            }
            changed = readings.changed() => {
                if changed.is_err() {
                    break;
                }
                let reading = readings.borrow_and_update().clone();
                let Some(reading) = reading else { continue };

                let line = if app.is_json() {
                    serde_json::to_string(&reading)? + "\n"
                } else {
                    format_live_line(&reading, &app.opts)
                };
                sink.write_all(line.as_bytes())?;
                sink.flush()?;

                seen += 1;
                if count > 0 && seen >= count {
                    break;
                }
            }
        }
    }

    monitor.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ThresholdArgs {
        ThresholdArgs {
            id: 1,
            power: None,
            current_max: None,
            voltage_min: None,
            voltage_max: None,
            offline_after: None,
        }
    }

    fn current() -> SensorThresholds {
        SensorThresholds {
            power_threshold: Some(2000.0),
            current_max_threshold: Some(16.0),
            voltage_min_threshold: None,
            voltage_max_threshold: None,
            offline_threshold_seconds: Some(30),
        }
    }

    #[test]
    fn test_no_flags_is_empty() {
        assert!(ThresholdChanges::from_args(&args()).unwrap().is_empty());
    }

    #[test]
    fn test_changes_keep_untouched_fields() {
        let changes = ThresholdChanges::from_args(&ThresholdArgs {
            power: Some("2500".to_string()),
            current_max: Some("none".to_string()),
            voltage_min: Some("207".to_string()),
            ..args()
        })
        .unwrap();
        assert!(!changes.is_empty());

        let next = changes.apply(current());
        assert_eq!(next.power_threshold, Some(2500.0));
        assert_eq!(next.current_max_threshold, None);
        assert_eq!(next.voltage_min_threshold, Some(207.0));
        assert_eq!(next.voltage_max_threshold, None);
        assert_eq!(next.offline_threshold_seconds, Some(30));
    }

    #[test]
    fn test_bad_value_names_the_flag() {
        let err = ThresholdChanges::from_args(&ThresholdArgs {
            offline_after: Some("soon".to_string()),
            ..args()
        })
        .unwrap_err()
        .to_string();
        assert!(err.contains("--offline-after"));
    }
}
