//! Property type-casting.
//!
//! A declared property is a `{value, type, element_type?}` entry; casting
//! converts the raw value into a [`PropertyValue`] via the handler for its
//! declared type. An unknown or omitted type deliberately falls back to
//! `str` - the store rejects inappropriate values at execution time, and
//! failing early here would reject declarations the store would accept.
//!
//! Structural problems (entry is not a map, or has no `value`) are
//! reported separately from conversion failures, always naming the
//! offending key. The first error encountered wins.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::{MutationError, Result};
use crate::model::{Bindings, PropertyMap, PropertyValue};

/// The closed set of scalar cast targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarKind {
    Int,
    Float,
    Bool,
    Str,
    DateTime,
}

impl ScalarKind {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "int" => Some(ScalarKind::Int),
            "float" => Some(ScalarKind::Float),
            "bool" => Some(ScalarKind::Bool),
            "str" => Some(ScalarKind::Str),
            "datetime" => Some(ScalarKind::DateTime),
            _ => None,
        }
    }
}

/// Casts a whole declared property map, returning the first error.
pub fn cast_properties(properties: &PropertyMap) -> Result<Bindings> {
    let mut cast = Bindings::new();
    for (key, entry) in properties {
        cast.insert(key.clone(), cast_entry(key, entry)?);
    }
    Ok(cast)
}

fn cast_entry(key: &str, entry: &Value) -> Result<PropertyValue> {
    let map = entry.as_object().ok_or_else(|| MutationError::MalformedProperty {
        key: key.to_string(),
        reason: format!(
            "must be a map with 'value' and optional 'type', got {}",
            json_type_name(entry)
        ),
    })?;
    let raw = map.get("value").ok_or_else(|| MutationError::MalformedProperty {
        key: key.to_string(),
        reason: "missing required 'value' field".into(),
    })?;
    let declared = map.get("type").and_then(Value::as_str).unwrap_or("str");

    if declared == "list" {
        let element_type = map.get("element_type").and_then(Value::as_str).unwrap_or("str");
        return cast_list(key, raw, element_type);
    }

    // Unknown scalar types fall back to str by design.
    let kind = ScalarKind::parse(declared).unwrap_or(ScalarKind::Str);
    cast_scalar(kind, raw).map_err(|reason| MutationError::Cast {
        key: key.to_string(),
        value: display_raw(raw),
        target: declared.to_string(),
        reason,
    })
}

fn cast_list(key: &str, raw: &Value, element_type: &str) -> Result<PropertyValue> {
    let items = raw.as_array().ok_or_else(|| MutationError::Cast {
        key: key.to_string(),
        value: display_raw(raw),
        target: "list".into(),
        reason: format!("expected a list, got {}", json_type_name(raw)),
    })?;
    // Unlike the top-level type, an unknown element type is an error:
    // there is no per-element declaration left to defer to.
    let kind = ScalarKind::parse(element_type).ok_or_else(|| MutationError::Cast {
        key: key.to_string(),
        value: display_raw(raw),
        target: "list".into(),
        reason: format!("unsupported element type for list: {element_type}"),
    })?;
    let mut cast = Vec::with_capacity(items.len());
    for item in items {
        let value = cast_scalar(kind, item).map_err(|reason| MutationError::Cast {
            key: key.to_string(),
            value: display_raw(item),
            target: format!("list<{element_type}>"),
            reason,
        })?;
        cast.push(value);
    }
    Ok(PropertyValue::List(cast))
}

fn cast_scalar(kind: ScalarKind, raw: &Value) -> std::result::Result<PropertyValue, String> {
    match kind {
        ScalarKind::Int => cast_int(raw),
        ScalarKind::Float => cast_float(raw),
        ScalarKind::Bool => Ok(cast_bool(raw)),
        ScalarKind::Str => cast_str(raw),
        ScalarKind::DateTime => cast_datetime(raw),
    }
}

fn cast_int(raw: &Value) -> std::result::Result<PropertyValue, String> {
    match raw {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(PropertyValue::Int(v))
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Ok(PropertyValue::Int(f.trunc() as i64))
                } else {
                    Err(format!("{f} is out of integer range"))
                }
            } else {
                Err("number is out of integer range".into())
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(PropertyValue::Int)
            .map_err(|e| e.to_string()),
        Value::Bool(b) => Ok(PropertyValue::Int(i64::from(*b))),
        other => Err(format!("expected an integer-compatible value, got {}", json_type_name(other))),
    }
}

fn cast_float(raw: &Value) -> std::result::Result<PropertyValue, String> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .map(PropertyValue::Float)
            .ok_or_else(|| "number is out of float range".into()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(PropertyValue::Float)
            .map_err(|e| e.to_string()),
        Value::Bool(b) => Ok(PropertyValue::Float(if *b { 1.0 } else { 0.0 })),
        other => Err(format!("expected a float-compatible value, got {}", json_type_name(other))),
    }
}

/// Native booleans pass through; anything else is stringified and matched
/// case-insensitively against the accepted truthy spellings. Everything
/// outside that set is false - `"2"` is false even though it is numeric
/// truthy elsewhere.
fn cast_bool(raw: &Value) -> PropertyValue {
    if let Value::Bool(b) = raw {
        return PropertyValue::Bool(*b);
    }
    let text = match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let truthy = matches!(text.to_lowercase().as_str(), "true" | "1" | "yes" | "y");
    PropertyValue::Bool(truthy)
}

fn cast_str(raw: &Value) -> std::result::Result<PropertyValue, String> {
    match raw {
        Value::String(s) => Ok(PropertyValue::Str(s.clone())),
        Value::Number(n) => Ok(PropertyValue::Str(n.to_string())),
        Value::Bool(b) => Ok(PropertyValue::Str(b.to_string())),
        other => Err(format!("expected a string-compatible value, got {}", json_type_name(other))),
    }
}

/// ISO-8601, with a trailing `Z` accepted as the UTC offset. Offset-less
/// datetimes and bare dates are accepted and interpreted as UTC.
fn cast_datetime(raw: &Value) -> std::result::Result<PropertyValue, String> {
    let text = match raw {
        Value::String(s) => s.trim(),
        other => {
            return Err(format!("expected an ISO-8601 string, got {}", json_type_name(other)));
        }
    };
    if let Ok(v) = DateTime::parse_from_rfc3339(text) {
        return Ok(PropertyValue::DateTime(v));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(PropertyValue::DateTime(datetime_utc(naive)));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(PropertyValue::DateTime(datetime_utc(naive)));
        }
    }
    Err(format!("'{text}' is not a valid ISO-8601 datetime"))
}

fn datetime_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    naive.and_utc().fixed_offset()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

fn display_raw(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
