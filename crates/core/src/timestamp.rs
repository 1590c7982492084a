//! Serde helpers for persisted timestamps.
//!
//! Timestamps are stored as RFC 3339 UTC strings with exactly three
//! fractional digits (`2026-01-31T09:15:02.120Z`). The fixed width makes
//! lexicographic order equal to chronological order, which is what the
//! document store sorts on.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format a timestamp the way it is persisted.
#[must_use]
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize a `DateTime<Utc>` as a fixed-width RFC 3339 string.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(ts))
}

/// Deserialize any RFC 3339 timestamp.
///
/// # Errors
///
/// Fails if the value is not a string or not valid RFC 3339.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

/// Same as the parent module, for `Option<DateTime<Utc>>`.
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_some(&super::format(ts)),
            None => serializer.serialize_none(),
        }
    }

    /// # Errors
    ///
    /// Fails if a present value is not valid RFC 3339.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2026, 1, 31, 9, 15, 2).unwrap();
        assert_eq!(format(&whole), "2026-01-31T09:15:02.000Z");
    }

    #[test]
    fn test_lexicographic_matches_chronological() {
        let earlier = Utc.with_ymd_and_hms(2026, 1, 31, 9, 15, 2).unwrap();
        let later = earlier + chrono::Duration::milliseconds(120);
        assert!(format(&earlier) < format(&later));
    }
}
