//! Decoding helpers for the shapes the API produces.
//!
//! The server is not entirely uniform: most timestamps are RFC 3339, but the
//! history series is rendered without an offset (`2024-05-01T12:30:00`), and
//! monetary fields may arrive either as JSON numbers or as decimal strings.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Parse a timestamp in either RFC 3339 or the offset-less history form.
///
/// Offset-less values are interpreted as UTC.
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(ts);
    }

    let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let naive_subsec =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");

    PrimitiveDateTime::parse(value, naive)
        .or_else(|_| PrimitiveDateTime::parse(value, naive_subsec))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// Serde adapter for required timestamps.
pub mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// Serde adapter for optional timestamps.
pub mod timestamp_opt {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<OffsetDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::option::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<OffsetDateTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
        }
    }
}

/// Deserialize a number that may be encoded as a JSON string (decimal fields).
pub fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    struct NumberVisitor;

    impl Visitor<'_> for NumberVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid number: {v}")))
        }
    }

    deserializer.deserialize_any(NumberVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339_timestamp() {
        let ts = parse_timestamp("2024-05-01T12:30:00Z").unwrap();
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.minute(), 30);
    }

    #[test]
    fn test_parse_rfc3339_with_offset_and_fraction() {
        let ts = parse_timestamp("2024-05-01T12:30:00.123456+02:00").unwrap();
        assert_eq!(ts.offset().whole_hours(), 2);
    }

    #[test]
    fn test_parse_naive_history_timestamp_is_utc() {
        let ts = parse_timestamp("2024-05-01T12:30:05").unwrap();
        assert!(ts.offset().is_utc());
        assert_eq!(ts.second(), 5);
    }

    #[test]
    fn test_parse_garbage_timestamp() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_number_or_string() {
        #[derive(Deserialize)]
        struct Price {
            #[serde(deserialize_with = "number_or_string")]
            value: f64,
        }

        let p: Price = serde_json::from_str(r#"{"value": "0.80"}"#).unwrap();
        assert!((p.value - 0.8).abs() < f64::EPSILON);

        let p: Price = serde_json::from_str(r#"{"value": 1.25}"#).unwrap();
        assert!((p.value - 1.25).abs() < f64::EPSILON);

        let p: Price = serde_json::from_str(r#"{"value": 2}"#).unwrap();
        assert!((p.value - 2.0).abs() < f64::EPSILON);

        assert!(serde_json::from_str::<Price>(r#"{"value": "abc"}"#).is_err());
    }
}
