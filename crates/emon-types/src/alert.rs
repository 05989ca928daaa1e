//! Alerts and the filters used to list them.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ParseError, ParseResult};
use crate::serde_helpers;

/// Alert severity.
///
/// Severities the client does not know about decode as [`AlertSeverity::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
    #[serde(other)]
    Other,
}

impl AlertSeverity {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
            AlertSeverity::Other => "other",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(AlertSeverity::Info),
            "warning" => Ok(AlertSeverity::Warning),
            "critical" => Ok(AlertSeverity::Critical),
            _ => Err(ParseError::UnknownVariant {
                kind: "alert severity",
                value: s.to_string(),
                expected: "info, warning, critical",
            }),
        }
    }
}

/// What triggered an alert.
///
/// Types the client does not know about decode as [`AlertType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AlertType {
    PowerHigh,
    CurrentHigh,
    VoltageAnomaly,
    SensorOffline,
    MonthlyLimit,
    Anomaly,
    #[serde(other)]
    Other,
}

impl AlertType {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::PowerHigh => "power_high",
            AlertType::CurrentHigh => "current_high",
            AlertType::VoltageAnomaly => "voltage_anomaly",
            AlertType::SensorOffline => "sensor_offline",
            AlertType::MonthlyLimit => "monthly_limit",
            AlertType::Anomaly => "anomaly",
            AlertType::Other => "other",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "power_high" => Ok(AlertType::PowerHigh),
            "current_high" => Ok(AlertType::CurrentHigh),
            "voltage_anomaly" => Ok(AlertType::VoltageAnomaly),
            "sensor_offline" => Ok(AlertType::SensorOffline),
            "monthly_limit" => Ok(AlertType::MonthlyLimit),
            "anomaly" => Ok(AlertType::Anomaly),
            _ => Err(ParseError::UnknownVariant {
                kind: "alert type",
                value: s.to_string(),
                expected: "power_high, current_high, voltage_anomaly, sensor_offline, monthly_limit, anomaly",
            }),
        }
    }
}

/// Read/resolved state used to filter the alert list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// Not yet read.
    Unread,
    /// Not yet resolved.
    Active,
    Resolved,
}

impl AlertStatus {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Unread => "unread",
            AlertStatus::Active => "active",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unread" => Ok(AlertStatus::Unread),
            "active" => Ok(AlertStatus::Active),
            "resolved" => Ok(AlertStatus::Resolved),
            _ => Err(ParseError::UnknownVariant {
                kind: "alert status",
                value: s.to_string(),
                expected: "unread, active, resolved",
            }),
        }
    }
}

/// A server-generated notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub severity: AlertSeverity,
    pub alert_type: AlertType,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub house_name: String,
    #[serde(default)]
    pub sensor_name: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(with = "serde_helpers::timestamp")]
    pub created_at: OffsetDateTime,
}

/// Server-side filter for the alert list.
///
/// `None` means "all"; empty filters are not sent at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertFilter {
    pub alert_type: Option<AlertType>,
    pub severity: Option<AlertSeverity>,
    pub status: Option<AlertStatus>,
}

impl AlertFilter {
    /// Filter that matches everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type(mut self, alert_type: Option<AlertType>) -> Self {
        self.alert_type = alert_type;
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Option<AlertSeverity>) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: Option<AlertStatus>) -> Self {
        self.status = status;
        self
    }

    /// Query parameters for the list request, in a stable order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(t) = self.alert_type {
            pairs.push(("type", t.as_str()));
        }
        if let Some(s) = self.severity {
            pairs.push(("severity", s.as_str()));
        }
        if let Some(s) = self.status {
            pairs.push(("status", s.as_str()));
        }
        pairs
    }
}

/// Payload for creating an alert by hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAlert {
    pub house: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor: Option<i64>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}
