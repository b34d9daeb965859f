//! Tolerant GUID decoding
//!
//! Upstream validators occasionally send placeholders such as `""` or
//! `"not-a-guid"` where a GUID is expected. Those decode to the nil UUID
//! instead of failing the whole payload.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// `deserialize_with` target: malformed, null or missing values become nil
pub fn lenient<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Uuid::parse_str(s.trim()).unwrap_or(Uuid::nil()),
        _ => Uuid::nil(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "lenient")]
        id: Uuid,
    }

    fn decode(json: &str) -> Uuid {
        serde_json::from_str::<Holder>(json).unwrap().id
    }

    #[test]
    fn test_valid_guid_is_kept() {
        let id = Uuid::new_v4();
        assert_eq!(decode(&format!(r#"{{"id":"{id}"}}"#)), id);
    }

    #[test]
    fn test_malformed_guid_becomes_nil() {
        assert_eq!(decode(r#"{"id":"not-a-guid"}"#), Uuid::nil());
        assert_eq!(decode(r#"{"id":""}"#), Uuid::nil());
        assert_eq!(decode(r#"{"id":12}"#), Uuid::nil());
        assert_eq!(decode(r#"{"id":null}"#), Uuid::nil());
        assert_eq!(decode(r#"{}"#), Uuid::nil());
    }
}
