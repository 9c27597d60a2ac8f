//! Deserialization helpers for payloads written by the CI worker and gateway.
//!
//! Both sides emit `null` for unset values. A `null` field reads as the
//! field's default, the same as a missing key.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// `deserialize_with` target: `null` becomes `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `deserialize_with` target for string maps: a `null` map is empty and a
/// `null` value is `""`.
pub(crate) fn null_string_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.unwrap_or_default()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        #[serde(deserialize_with = "null_as_default")]
        name: String,
        #[serde(deserialize_with = "null_as_default")]
        count: i64,
        #[serde(deserialize_with = "null_string_map")]
        tags: HashMap<String, String>,
    }

    #[test]
    fn test_null_fields_read_as_default() {
        let sample: Sample =
            serde_json::from_str(r#"{"name":null,"count":null,"tags":null}"#).unwrap();
        assert_eq!(sample.name, "");
        assert_eq!(sample.count, 0);
        assert!(sample.tags.is_empty());
    }

    #[test]
    fn test_null_map_values_read_as_empty() {
        let sample: Sample =
            serde_json::from_str(r#"{"name":"a","tags":{"x":"1","y":null}}"#).unwrap();
        assert_eq!(sample.name, "a");
        assert_eq!(sample.tags["x"], "1");
        assert_eq!(sample.tags["y"], "");
    }

    #[test]
    fn test_wrong_type_still_fails() {
        assert!(serde_json::from_str::<Sample>(r#"{"count":"many"}"#).is_err());
    }
}
