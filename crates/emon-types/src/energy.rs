//! Houses, sensors, readings and the per-house statistics block.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::serde_helpers;

/// Price per kWh used when a sensor's house carries no price.
pub const DEFAULT_PRICE_PER_KWH: f64 = 0.80;

/// A dwelling owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(
        default = "default_price",
        deserialize_with = "serde_helpers::number_or_string"
    )]
    pub price_per_kwh: f64,
    /// Sensors nested by the house listing endpoint.
    #[serde(default)]
    pub sensors: Vec<Sensor>,
}

fn default_price() -> f64 {
    DEFAULT_PRICE_PER_KWH
}

/// How a sensor refers to its house.
///
/// The listing endpoints return a bare id; detail endpoints nest a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HouseRef {
    Id(i64),
    Summary(HouseSummary),
}

impl HouseRef {
    /// The house id regardless of representation.
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            HouseRef::Id(id) => *id,
            HouseRef::Summary(summary) => summary.id,
        }
    }

    /// House name, if the server nested it.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            HouseRef::Id(_) => None,
            HouseRef::Summary(summary) => Some(&summary.name),
        }
    }

    /// Price per kWh, falling back to [`DEFAULT_PRICE_PER_KWH`].
    #[must_use]
    pub fn price_per_kwh(&self) -> f64 {
        match self {
            HouseRef::Summary(HouseSummary {
                price_per_kwh: Some(price),
                ..
            }) => *price,
            _ => DEFAULT_PRICE_PER_KWH,
        }
    }
}

/// House fields nested inside a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseSummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "optional_price")]
    pub price_per_kwh: Option<f64>,
}

fn optional_price<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "serde_helpers::number_or_string")] f64);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

/// A monitored energy-measurement endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: i64,
    /// Owning house; absent when nested inside a house listing.
    #[serde(default)]
    pub house: Option<HouseRef>,
    pub name: String,
    /// Hardware identifier reported by the device (e.g. "pzem001").
    #[serde(default)]
    pub sensor_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub power_threshold: Option<f64>,
    #[serde(default)]
    pub current_max_threshold: Option<f64>,
    #[serde(default)]
    pub voltage_min_threshold: Option<f64>,
    #[serde(default)]
    pub voltage_max_threshold: Option<f64>,
    #[serde(default)]
    pub offline_threshold_seconds: Option<u32>,
    /// Most recent stored measurement (admin listing).
    #[serde(default)]
    pub last_reading: Option<HistoryPoint>,
}

/// Alert thresholds for a single sensor, sent as a partial update.
///
/// Every field is serialized; `None` clears the threshold on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorThresholds {
    pub power_threshold: Option<f64>,
    pub current_max_threshold: Option<f64>,
    pub voltage_min_threshold: Option<f64>,
    pub voltage_max_threshold: Option<f64>,
    pub offline_threshold_seconds: Option<u32>,
}

/// Offline threshold applied when a sensor has none configured.
pub const DEFAULT_OFFLINE_THRESHOLD_SECS: u32 = 30;

impl SensorThresholds {
    /// Start from the sensor's current thresholds.
    #[must_use]
    pub fn from_sensor(sensor: &Sensor) -> Self {
        Self {
            power_threshold: sensor.power_threshold,
            current_max_threshold: sensor.current_max_threshold,
            voltage_min_threshold: sensor.voltage_min_threshold,
            voltage_max_threshold: sensor.voltage_max_threshold,
            offline_threshold_seconds: Some(
                sensor
                    .offline_threshold_seconds
                    .unwrap_or(DEFAULT_OFFLINE_THRESHOLD_SECS),
            ),
        }
    }
}

/// The most recent instantaneous measurement for a sensor.
///
/// Replaced wholesale on every poll; never accumulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveReading {
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(with = "serde_helpers::timestamp_opt", default)]
    pub timestamp: Option<OffsetDateTime>,
}

/// One stored sample in a sensor's history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    #[serde(with = "serde_helpers::timestamp")]
    pub timestamp: OffsetDateTime,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub frequency: Option<f64>,
    #[serde(default)]
    pub pf: Option<f64>,
}

/// Current vs previous consumption for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub current: f64,
    pub previous: f64,
    pub change_percent: f64,
}

/// Server-side consumption forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_kwh: f64,
    pub predicted_cost: f64,
    pub daily_average: f64,
}

/// One entry in the per-house sensor ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRanking {
    pub sensor_id: i64,
    pub sensor_name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub kwh: f64,
    pub cost: f64,
}

/// Aggregates computed by the server for a house.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseStatistics {
    pub day_comparison: Comparison,
    pub week_comparison: Comparison,
    pub month_comparison: Comparison,
    pub prediction: Prediction,
    #[serde(default)]
    pub sensor_rankings: Vec<SensorRanking>,
}
