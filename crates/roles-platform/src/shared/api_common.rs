//! Common API types and utilities

use serde::{de, Deserialize, Deserializer};

/// Query strings arrive as text; accept both `limit=10` and a JSON number.
pub fn deserialize_u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNum {
        Num(u32),
        Str(String),
    }

    match Option::<StringOrNum>::deserialize(deserializer)? {
        Some(StringOrNum::Num(n)) => Ok(Some(n)),
        Some(StringOrNum::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(StringOrNum::Str(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
        None => Ok(None),
    }
}

/// Treat `?param=` the same as an absent parameter.
pub fn deserialize_non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "deserialize_u32_opt")]
        limit: Option<u32>,
        #[serde(default, deserialize_with = "deserialize_non_empty_string")]
        cursor: Option<String>,
    }

    #[test]
    fn test_limit_from_number_or_string() {
        let q: Query = serde_json::from_str(r#"{"limit": 5}"#).unwrap();
        assert_eq!(q.limit, Some(5));

        let q: Query = serde_json::from_str(r#"{"limit": "7"}"#).unwrap();
        assert_eq!(q.limit, Some(7));

        let q: Query = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(q.limit, None);

        assert!(serde_json::from_str::<Query>(r#"{"limit": "ten"}"#).is_err());
    }

    #[test]
    fn test_empty_cursor_is_absent() {
        let q: Query = serde_json::from_str(r#"{"cursor": ""}"#).unwrap();
        assert_eq!(q.cursor, None);
    }
}
