//! Coercion of loosely typed numbers coming from forms, stored JSON and the
//! estimator. Nothing here fails: anything unusable becomes `0`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Raw meal form fields. Numbers may arrive as JSON numbers, strings or not
/// at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddMealInput {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub calories: Value,
    #[serde(default)]
    pub carbs: Value,
    #[serde(default)]
    pub protein: Value,
    #[serde(default)]
    pub fat: Value,
}

/// Form-field coercion: integer part of a number, or the leading integer of
/// a string (`"12g"` → 12). Negative, missing or garbage → 0.
pub fn coerce_count(value: &Value) -> u32 {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                clamp(i)
            } else if let Some(u) = n.as_u64() {
                u.min(u32::MAX as u64) as u32
            } else {
                n.as_f64().map(|f| clamp_f64(f.trunc())).unwrap_or(0)
            }
        }
        Value::String(s) => parse_int_prefix(s).map(clamp).unwrap_or(0),
        _ => 0,
    }
}

/// Leading optional sign and decimal digits after leading whitespace.
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: &str = {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Serde adapter for numeric fields in stored records and estimator payloads.
/// Fractions round to the nearest whole number.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Number(n) => n.as_f64().map(|f| clamp_f64(f.round())).unwrap_or(0),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => clamp_f64(f.round()),
            _ => coerce_count(&value),
        },
        _ => 0,
    })
}

fn clamp(i: i64) -> u32 {
    i.clamp(0, u32::MAX as i64) as u32
}

fn clamp_f64(f: f64) -> u32 {
    if f.is_nan() || f <= 0.0 {
        0
    } else if f >= u32::MAX as f64 {
        u32::MAX
    } else {
        f as u32
    }
}
