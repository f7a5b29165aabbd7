//! Lenient readers for shape definition fields.
//!
//! A field of the wrong JSON type is reported as a schema mismatch and read
//! as absent, so the caller falls back to its default.

use crate::error::LottieError;
use serde_json::Value;

static NULL: Value = Value::Null;

fn mismatch(key: &str, expected: &'static str) {
    let err = LottieError::schema_mismatch(key, expected);
    tracing::debug!("{err}, using default");
}

pub(crate) fn string(def: &Value, key: &str) -> Option<String> {
    match def.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        _ => {
            mismatch(key, "string");
            None
        }
    }
}

/// Integer codes; accepts floats and numeric strings the way exporters write them.
pub(crate) fn integer(def: &Value, key: &str) -> Option<i64> {
    match def.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) => Some(f as i64),
            Err(_) => {
                mismatch(key, "integer");
                None
            }
        },
        Value::Bool(b) => Some(*b as i64),
        Value::Null => None,
        _ => {
            mismatch(key, "integer");
            None
        }
    }
}

pub(crate) fn number(def: &Value, key: &str) -> Option<f32> {
    match def.get(key)? {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => match s.trim().parse::<f32>() {
            Ok(f) => Some(f),
            Err(_) => {
                mismatch(key, "number");
                None
            }
        },
        Value::Null => None,
        _ => {
            mismatch(key, "number");
            None
        }
    }
}

pub(crate) fn flag(def: &Value, key: &str) -> bool {
    match def.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        Some(Value::Null) | None => false,
        Some(_) => {
            mismatch(key, "bool");
            false
        }
    }
}

pub(crate) fn array<'a>(def: &'a Value, key: &str) -> &'a [Value] {
    match def.get(key) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => &[],
        Some(_) => {
            mismatch(key, "array");
            &[]
        }
    }
}

/// A property fragment, or `null` when the field is absent.
pub(crate) fn fragment<'a>(def: &'a Value, key: &str) -> &'a Value {
    def.get(key).unwrap_or(&NULL)
}
