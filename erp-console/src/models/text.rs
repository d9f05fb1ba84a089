//! Loose text and flag decoding for fields the backend types inconsistently.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Strings pass through, numbers are stringified and objects contribute
/// their `Name`. Blank text becomes `None`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_of(&value))
}

pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("name"))
            .and_then(|(_, v)| text_of(v)),
        _ => None,
    }
}

/// `true`/`false`, `"true"`/`"Active"`, `1`/`0`. Anything else is `None`.
pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "active" | "yes" | "1" => Some(true),
            "false" | "inactive" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_from_various_shapes() {
        assert_eq!(text_of(&json!("  Sales ")), Some("Sales".to_string()));
        assert_eq!(text_of(&json!(12)), Some("12".to_string()));
        assert_eq!(text_of(&json!({ "Id": 3, "Name": "Finance" })), Some("Finance".to_string()));
        assert_eq!(text_of(&json!("")), None);
        assert_eq!(text_of(&json!(null)), None);
    }
}
