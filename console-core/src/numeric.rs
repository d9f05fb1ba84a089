//! Lenient numeric and date coercion for form input and loosely typed payloads.
//!
//! Amounts follow the browser `parseFloat(x) || 0` rule: a leading numeric
//! prefix is honoured and anything else becomes zero, so malformed input can
//! never poison a total.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;
use std::str::FromStr;

/// Parse the leading numeric prefix of `input`, or zero.
pub fn parse_amount(input: &str) -> Decimal {
    numeric_prefix(input.trim_start())
        .and_then(|prefix| {
            if prefix.contains(['e', 'E']) {
                Decimal::from_scientific(&prefix).ok()
            } else {
                Decimal::from_str(&prefix).ok()
            }
        })
        .unwrap_or(Decimal::ZERO)
}

/// The longest leading `[+-]digits[.digits][e[+-]digits]` run, rewritten so
/// `Decimal` can parse it (`.5` becomes `0.5`, `5.` becomes `5`).
fn numeric_prefix(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_part = &s[int_start..pos];

    let mut frac_part = "";
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        frac_part = &s[frac_start..frac_end];
        pos = frac_end;
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut exp_part = "";
    if pos < bytes.len() && matches!(bytes[pos], b'e' | b'E') {
        let mut exp_end = pos + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            exp_part = &s[pos..exp_end];
        }
    }

    let mut out = String::with_capacity(pos + 2);
    if negative {
        out.push('-');
    }
    out.push_str(if int_part.is_empty() { "0" } else { int_part });
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out.push_str(exp_part);
    Some(out)
}

/// Coerce any JSON value to an amount. Numbers and numeric strings parse,
/// everything else is zero.
pub fn coerce_amount(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => parse_amount(&n.to_string()),
        Value::String(s) => parse_amount(s),
        _ => Decimal::ZERO,
    }
}

/// Clamp at zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Round half away from zero to two places, for display only.
pub fn to_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// `#[serde(with = "lenient")]` for `Decimal` fields: decode via
/// [`coerce_amount`], encode as a JSON number.
pub mod lenient {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce_amount(&value))
    }

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_f64().unwrap_or(0.0))
    }
}

/// Like [`lenient`] but keeps absence (`null`, missing, empty string) as `None`.
pub mod lenient_option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match &value {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            other => Some(coerce_amount(other)),
        })
    }

    pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_f64(v.to_f64().unwrap_or(0.0)),
            None => serializer.serialize_none(),
        }
    }
}

/// Parse `YYYY-MM-DD`, keeping only the date part of an ISO date-time.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// `#[serde(with = "lenient_date")]` for `Option<NaiveDate>` fields.
pub mod lenient_date {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().and_then(parse_date))
    }

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }
}
