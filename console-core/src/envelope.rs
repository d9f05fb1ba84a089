//! Response envelope normalization.
//!
//! The backend wraps lists inconsistently: bare arrays, `{Data: [...]}`,
//! `{Data: {$values: [...]}}`, `{data: ...}` or a bare `{$values: [...]}`
//! from its reference-preserving serializer. Everything is unwrapped here,
//! once, before typed decoding.

use crate::error::AppError;
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{Map, Value};

/// Every list shape the API is known to return, tried in this order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Flat(Vec<Value>),
    UpperData {
        #[serde(rename = "Data")]
        data: DataList,
    },
    LowerData {
        #[serde(rename = "data")]
        data: DataList,
    },
    Values {
        #[serde(rename = "$values")]
        values: Vec<Value>,
    },
    Unrecognised(IgnoredAny),
}

/// The payload under a `Data`/`data` key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DataList {
    Flat(Vec<Value>),
    Values {
        #[serde(rename = "$values")]
        values: Vec<Value>,
    },
}

impl Envelope {
    pub fn parse(value: &Value) -> Self {
        Envelope::deserialize(value).unwrap_or(Envelope::Unrecognised(IgnoredAny))
    }

    pub fn into_records(self) -> Vec<Value> {
        match self {
            Envelope::Flat(items) | Envelope::Values { values: items } => items,
            Envelope::UpperData { data } | Envelope::LowerData { data } => match data {
                DataList::Flat(items) | DataList::Values { values: items } => items,
            },
            Envelope::Unrecognised(_) => Vec::new(),
        }
    }
}

/// Flatten any known list shape. Unknown shapes yield an empty list.
pub fn unwrap_list(value: &Value) -> Vec<Value> {
    Envelope::parse(value).into_records()
}

/// Single-record responses may arrive bare or under `Data`/`data`.
pub fn unwrap_record(value: &Value) -> &Value {
    for key in ["Data", "data"] {
        if let Some(inner) = value.get(key)
            && inner.is_object()
        {
            return inner;
        }
    }
    value
}

/// Upper-case the first letter of every object key, recursively, so
/// `invoiceNumber` and `InvoiceNumber` decode to the same field.
/// `$`-prefixed serializer keys are left alone.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut normalized = Map::with_capacity(map.len());
            for (key, nested) in map {
                let key = pascal_case(&key);
                let nested = normalize_keys(nested);
                // One spelling is kept when both casings are present.
                normalized.entry(key).or_insert(nested);
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

fn pascal_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            let mut out = String::with_capacity(key.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        _ => key.to_string(),
    }
}

/// Unwrap and decode a list. Records that do not decode are skipped and
/// logged rather than failing the whole page.
pub fn decode_list<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    unwrap_list(value)
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            match serde_json::from_value(normalize_keys(record)) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping undecodable record");
                    None
                }
            }
        })
        .collect()
}

pub fn decode_record<T: DeserializeOwned>(value: &Value) -> Result<T, AppError> {
    Ok(serde_json::from_value(normalize_keys(
        unwrap_record(value).clone(),
    ))?)
}

/// `#[serde(deserialize_with = "envelope::list")]` for nested arrays such as
/// invoice items, which arrive `$values`-wrapped as often as not.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_list(&value))
}
