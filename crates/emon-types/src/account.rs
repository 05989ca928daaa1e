//! User profile and per-user settings.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ParseError, ParseResult};
use crate::serde_helpers;

/// Refresh interval used when the user's settings have not been loaded yet.
pub const DEFAULT_LIVE_REFRESH_SECS: u32 = 5;

/// How often the server e-mails alert digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFrequency {
    /// One message per alert.
    Immediate,
    /// Hourly digest.
    Hourly,
    /// Daily digest.
    #[default]
    Daily,
}

impl AlertFrequency {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertFrequency::Immediate => "immediate",
            AlertFrequency::Hourly => "hourly",
            AlertFrequency::Daily => "daily",
        }
    }
}

impl fmt::Display for AlertFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertFrequency {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(AlertFrequency::Immediate),
            "hourly" => Ok(AlertFrequency::Hourly),
            "daily" => Ok(AlertFrequency::Daily),
            _ => Err(ParseError::UnknownVariant {
                kind: "alert frequency",
                value: s.to_string(),
                expected: "immediate, hourly, daily",
            }),
        }
    }
}

/// Per-user preferences stored on the server.
///
/// The in-memory copy is only ever replaced wholesale by the server's answer
/// to a save, never merged field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Settings resource id (used in the update URL).
    pub id: i64,
    /// Live view refresh interval in seconds (at least 1).
    #[serde(rename = "live_refresh_interval")]
    pub live_refresh_interval_secs: u32,
    /// Whether alert e-mails are sent.
    #[serde(rename = "email_alerts")]
    pub email_alerts_enabled: bool,
    /// Digest cadence for alert e-mails.
    pub alert_frequency: AlertFrequency,
}

impl UserSettings {
    /// Check the values the server would reject.
    pub fn validate(&self) -> ParseResult<()> {
        if self.live_refresh_interval_secs < 1 {
            return Err(ParseError::OutOfRange {
                field: "live_refresh_interval",
                message: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    /// Refresh interval in milliseconds.
    #[must_use]
    pub fn live_refresh_interval_ms(&self) -> u64 {
        u64::from(self.live_refresh_interval_secs) * 1000
    }
}

/// The authenticated user as returned by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Staff users may use the admin area.
    #[serde(default)]
    pub is_staff: bool,
    #[serde(with = "serde_helpers::timestamp_opt", default)]
    pub date_joined: Option<OffsetDateTime>,
    /// Nested settings; may be missing for accounts created outside the app.
    #[serde(default)]
    pub settings: Option<UserSettings>,
}

/// Minimal user reference embedded in admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Credentials posted to the token endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Token endpoint answer.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_wire_names() {
        let json = r#"{"id": 3, "live_refresh_interval": 10, "email_alerts": true, "alert_frequency": "hourly"}"#;
        let settings: UserSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.id, 3);
        assert_eq!(settings.live_refresh_interval_secs, 10);
        assert!(settings.email_alerts_enabled);
        assert_eq!(settings.alert_frequency, AlertFrequency::Hourly);
        assert_eq!(settings.live_refresh_interval_ms(), 10_000);

        let back = serde_json::to_value(&settings).unwrap();
        assert_eq!(back["live_refresh_interval"], 10);
        assert_eq!(back["email_alerts"], true);
        assert_eq!(back["alert_frequency"], "hourly");
    }

    #[test]
    fn test_settings_validate_rejects_zero_interval() {
        let settings = UserSettings {
            id: 1,
            live_refresh_interval_secs: 0,
            email_alerts_enabled: false,
            alert_frequency: AlertFrequency::Daily,
        };
        assert!(matches!(
            settings.validate(),
            Err(ParseError::OutOfRange { field: "live_refresh_interval", .. })
        ));
    }

    #[test]
    fn test_profile_without_settings() {
        let json = r#"{"id": 1, "username": "ala", "is_staff": false, "date_joined": "2024-01-02T03:04:05Z"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.username, "ala");
        assert!(profile.email.is_empty());
        assert!(profile.settings.is_none());
        assert!(profile.date_joined.is_some());
    }

    #[test]
    fn test_alert_frequency_from_str() {
        assert_eq!("Immediate".parse::<AlertFrequency>(), Ok(AlertFrequency::Immediate));
        assert_eq!(" daily ".parse::<AlertFrequency>(), Ok(AlertFrequency::Daily));
        assert!("weekly".parse::<AlertFrequency>().is_err());
    }
}
