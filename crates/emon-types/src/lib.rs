//! Wire types for the home energy monitoring API.
//!
//! This crate holds the data model shared by the API gateway and the
//! command-line client: user accounts and settings, houses and sensors,
//! live and historical readings, per-house statistics, and alerts.
//!
//! Everything here is plain data with `serde` derives. No I/O happens in
//! this crate.
//!
//! # Example
//!
//! ```
//! use emon_types::{AlertFilter, AlertStatus};
//!
//! let filter = AlertFilter::all().with_status(Some(AlertStatus::Unread));
//! assert_eq!(filter.query_pairs(), vec![("status", "unread")]);
//! ```

pub mod account;
pub mod admin;
pub mod alert;
pub mod energy;
pub mod error;
pub mod serde_helpers;

pub use account::{
    AlertFrequency, Credentials, DEFAULT_LIVE_REFRESH_SECS, TokenResponse, UserProfile,
    UserSettings, UserSummary,
};
pub use admin::{AdminHouse, NewHouse};
pub use alert::{Alert, AlertFilter, AlertSeverity, AlertStatus, AlertType, NewAlert};
pub use energy::{
    Comparison, DEFAULT_PRICE_PER_KWH, HistoryPoint, House, HouseRef, HouseStatistics,
    HouseSummary, LiveReading, Prediction, Sensor, SensorRanking, SensorThresholds,
};
pub use error::{ParseError, ParseResult};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn severity() -> impl Strategy<Value = AlertSeverity> {
        prop_oneof![
            Just(AlertSeverity::Info),
            Just(AlertSeverity::Warning),
            Just(AlertSeverity::Critical),
        ]
    }

    fn status() -> impl Strategy<Value = AlertStatus> {
        prop_oneof![
            Just(AlertStatus::Unread),
            Just(AlertStatus::Active),
            Just(AlertStatus::Resolved),
        ]
    }

    proptest! {
        #[test]
        fn test_filter_pairs_only_carry_set_fields(
            sev in proptest::option::of(severity()),
            st in proptest::option::of(status()),
        ) {
            let filter = AlertFilter::all().with_severity(sev).with_status(st);
            let pairs = filter.query_pairs();
            prop_assert_eq!(pairs.len(), usize::from(sev.is_some()) + usize::from(st.is_some()));
            prop_assert!(pairs.iter().all(|(_, v)| !v.is_empty()));
        }

        #[test]
        fn test_severity_display_parses_back(sev in severity()) {
            prop_assert_eq!(sev.to_string().parse::<AlertSeverity>().unwrap(), sev);
        }
    }
}
