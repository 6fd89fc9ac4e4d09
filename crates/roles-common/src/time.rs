//! Timestamp helpers
//!
//! Records and responses carry ISO-8601 UTC strings with millisecond
//! precision, e.g. `2024-05-01T12:30:00.000Z`.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_iso(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Current time, formatted.
pub fn now_iso() -> String {
    format_iso(&Utc::now())
}

/// Current time truncated to millisecond precision, so a value survives a
/// format/parse round trip unchanged.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Serde adapter for `DateTime<Utc>` fields stored as ISO millisecond strings.
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_iso(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "iso_millis")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_format_matches_js_iso_strings() {
        let ts = parse_iso("2024-01-02T03:04:05.678Z").unwrap();
        assert_eq!(format_iso(&ts), "2024-01-02T03:04:05.678Z");
    }

    #[test]
    fn test_parse_accepts_offsets() {
        let ts = parse_iso("2024-01-02T05:04:05.000+02:00").unwrap();
        assert_eq!(format_iso(&ts), "2024-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_serde_adapter() {
        let json = r#"{"at":"2023-12-31T23:59:59.999Z"}"#;
        let stamped: Stamped = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&stamped).unwrap(), json);

        assert!(serde_json::from_str::<Stamped>(r#"{"at":"yesterday"}"#).is_err());
    }

    #[test]
    fn test_now_millis_has_no_sub_millisecond_part() {
        let now = now_millis();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
        assert_eq!(parse_iso(&format_iso(&now)).unwrap(), now);
    }
}
