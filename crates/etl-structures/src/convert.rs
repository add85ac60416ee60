//! Schema-driven value coercion.
//!
//! API and CSV extracts usually deliver every field as a string.
//! [`convert_dict_types`] coerces the fields named in a schema to their
//! intended types. JSON has no date type, so dates and datetimes come back as
//! ISO 8601 strings; unix timestamps are read as UTC seconds.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::error::{kind_name, Result, StructureError};

/// Target type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConvertType {
    Int,
    Float,
    Bool,
    /// `YYYY-MM-DD` string in, normalised `YYYY-MM-DD` out.
    Date,
    /// Parsed with the configured formats, rendered `YYYY-MM-DDTHH:MM:SS`.
    Datetime,
    /// Unix seconds to an ISO datetime string.
    Timestamp,
    TimestampToIso,
    TimestampToIsoDate,
    TimestampToIsoYyyyMm,
    TimestampToIsoYyyy,
    Str,
}

impl ConvertType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConvertType::Int => "int",
            ConvertType::Float => "float",
            ConvertType::Bool => "bool",
            ConvertType::Date => "date",
            ConvertType::Datetime => "datetime",
            ConvertType::Timestamp => "timestamp",
            ConvertType::TimestampToIso => "timestamp_to_iso",
            ConvertType::TimestampToIsoDate => "timestamp_to_iso_date",
            ConvertType::TimestampToIsoYyyyMm => "timestamp_to_iso_YYYY-MM",
            ConvertType::TimestampToIsoYyyy => "timestamp_to_iso_YYYY",
            ConvertType::Str => "str",
        }
    }
}

impl fmt::Display for ConvertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConvertType {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "int" => ConvertType::Int,
            "float" => ConvertType::Float,
            "bool" => ConvertType::Bool,
            "date" => ConvertType::Date,
            "datetime" => ConvertType::Datetime,
            "timestamp" => ConvertType::Timestamp,
            "timestamp_to_iso" => ConvertType::TimestampToIso,
            "timestamp_to_iso_date" => ConvertType::TimestampToIsoDate,
            "timestamp_to_iso_YYYY-MM" => ConvertType::TimestampToIsoYyyyMm,
            "timestamp_to_iso_YYYY" => ConvertType::TimestampToIsoYyyy,
            "str" => ConvertType::Str,
            _ => return Err(StructureError::UnknownOption(format!("'{s}': unknown conversion type"))),
        })
    }
}

impl TryFrom<String> for ConvertType {
    type Error = StructureError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ConvertType> for String {
    fn from(t: ConvertType) -> Self {
        t.as_str().to_string()
    }
}

/// Field name to target type.
pub type Schema = HashMap<String, ConvertType>;

pub const DEFAULT_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d"];

const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Descend into nested objects and arrays.
    pub recursive: bool,
    /// Fail on the first value that cannot be converted instead of keeping it.
    pub strict: bool,
    pub empty_string_to_none: bool,
    /// chrono formats tried in order for [`ConvertType::Datetime`].
    pub datetime_formats: Vec<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            strict: false,
            empty_string_to_none: false,
            datetime_formats: DEFAULT_DATETIME_FORMATS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Return a copy of `value` with schema fields coerced to their types.
///
/// Only objects (and, when `recursive`, arrays and nested objects) are
/// processed; anything else is returned unchanged. `null` is always kept.
///
/// # Errors
///
/// In strict mode, returns [`StructureError::Conversion`] for the first value
/// that cannot be converted. Non-strict mode never fails and keeps the
/// original value instead.
///
/// # Examples
///
/// ```
/// use etl_structures::{convert_dict_types, ConvertOptions, ConvertType, Schema};
/// use serde_json::json;
///
/// let schema = Schema::from([
///     ("count".to_string(), ConvertType::Int),
///     ("active".to_string(), ConvertType::Bool),
/// ]);
/// let data = json!({"count": "42", "active": "yes", "name": "x"});
/// let out = convert_dict_types(&data, &schema, &ConvertOptions::default()).unwrap();
/// assert_eq!(out, json!({"count": 42, "active": true, "name": "x"}));
/// ```
pub fn convert_dict_types(value: &Value, schema: &Schema, opts: &ConvertOptions) -> Result<Value> {
    debug!(fields = schema.len(), recursive = opts.recursive, strict = opts.strict, "converting types");
    convert_node(value, schema, opts)
}

fn convert_node(value: &Value, schema: &Schema, opts: &ConvertOptions) -> Result<Value> {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, child) in map {
                let converted = if opts.recursive && (child.is_object() || child.is_array()) {
                    convert_node(child, schema, opts)?
                } else {
                    match schema.get(key) {
                        Some(&target) => convert_field(key, child, target, opts)?,
                        None => child.clone(),
                    }
                };
                out.insert(key.clone(), converted);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) if opts.recursive => items
            .iter()
            .map(|item| convert_node(item, schema, opts))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn convert_field(key: &str, value: &Value, target: ConvertType, opts: &ConvertOptions) -> Result<Value> {
    match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) if s.is_empty() => {
            return Ok(if opts.empty_string_to_none {
                Value::Null
            } else {
                value.clone()
            });
        }
        _ => {}
    }

    match convert_value(value, target, opts) {
        Ok(converted) => Ok(converted),
        Err(reason) if opts.strict => Err(StructureError::Conversion {
            key: key.to_string(),
            target: target.to_string(),
            reason,
        }),
        Err(reason) => {
            debug!(key, %target, reason, "conversion failed; keeping original value");
            Ok(value.clone())
        }
    }
}

/// Convert one non-null, non-empty value. The error is a human-readable
/// reason.
fn convert_value(
    value: &Value,
    target: ConvertType,
    opts: &ConvertOptions,
) -> std::result::Result<Value, String> {
    match target {
        ConvertType::Int => to_int(value).map(Value::from),
        ConvertType::Float => to_float(value).and_then(float_value),
        ConvertType::Bool => Ok(Value::Bool(to_bool(value))),
        ConvertType::Date => match value {
            Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .map_err(|e| format!("'{s}' is not a YYYY-MM-DD date: {e}")),
            other => Ok(other.clone()),
        },
        ConvertType::Datetime => match value {
            Value::String(s) => parse_datetime(s, &opts.datetime_formats)
                .map(|dt| Value::String(dt.format(ISO_DATETIME).to_string())),
            other => Ok(other.clone()),
        },
        ConvertType::Timestamp | ConvertType::TimestampToIso => format_timestamp(value, ISO_DATETIME),
        ConvertType::TimestampToIsoDate => format_timestamp(value, "%Y-%m-%d"),
        ConvertType::TimestampToIsoYyyyMm => format_timestamp(value, "%Y-%m"),
        ConvertType::TimestampToIsoYyyy => format_timestamp(value, "%Y"),
        ConvertType::Str => Ok(Value::String(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })),
    }
}

fn to_int(value: &Value) -> std::result::Result<i64, String> {
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(truncate_f64))
            .ok_or_else(|| format!("{n} does not fit in a 64-bit integer")),
        Value::String(s) => {
            let t = s.trim();
            t.parse::<i64>()
                .ok()
                .or_else(|| t.parse::<f64>().ok().and_then(truncate_f64))
                .ok_or_else(|| format!("'{s}' is not a number"))
        }
        other => Err(format!("cannot convert {} to int", kind_name(other))),
    }
}

fn truncate_f64(f: f64) -> Option<i64> {
    let t = f.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

fn to_float(value: &Value) -> std::result::Result<f64, String> {
    match value {
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("{n} is not representable as float")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{s}' is not a number")),
        other => Err(format!("cannot convert {} to float", kind_name(other))),
    }
}

fn float_value(f: f64) -> std::result::Result<Value, String> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| format!("{f} has no JSON representation"))
}

/// `"true"`, `"1"`, `"yes"`, `"on"` (any case) are true; numbers are true
/// when non-zero; containers when non-empty.
fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn parse_datetime(s: &str, formats: &[String]) -> std::result::Result<NaiveDateTime, String> {
    formats
        .iter()
        .find_map(|fmt| {
            NaiveDateTime::parse_from_str(s, fmt).ok().or_else(|| {
                // date-only formats carry no time; midnight is implied
                NaiveDate::parse_from_str(s, fmt)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
        })
        .ok_or_else(|| format!("unable to parse datetime '{s}'"))
}

fn format_timestamp(value: &Value, fmt: &str) -> std::result::Result<Value, String> {
    let seconds = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("{n} is not a timestamp"))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{s}' is not a timestamp"))?,
        other => return Ok(other.clone()),
    };
    let dt = utc_from_seconds(seconds).ok_or_else(|| format!("timestamp {seconds} out of range"))?;
    Ok(Value::String(dt.format(fmt).to_string()))
}

fn utc_from_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let micros = ((seconds - whole) * 1e6).round() as u32;
    let (whole, micros) = if micros >= 1_000_000 { (whole + 1.0, 0) } else { (whole, micros) };
    let secs = truncate_f64(whole)?;
    DateTime::from_timestamp(secs, micros * 1_000)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TS: i64 = 1_735_056_631; // 2024-12-24T16:10:31Z

    fn convert_one(value: Value, target: ConvertType) -> Value {
        let schema = Schema::from([("k".to_string(), target)]);
        let out = convert_dict_types(&json!({ "k": value }), &schema, &ConvertOptions::default()).unwrap();
        out["k"].clone()
    }

    fn schema(pairs: &[(&str, ConvertType)]) -> Schema {
        pairs.iter().map(|(k, t)| (k.to_string(), *t)).collect()
    }

    fn conversion_data() -> Value {
        json!({
            "str_int": "42",
            "str_float": "3.14",
            "str_bool_true": "true",
            "str_bool_false": "false",
            "str_date": "2024-12-25",
            "str_datetime": "2024-12-25T15:30:45",
            "str_timestamp": "1735056631",
            "int_val": 42,
            "float_val": 3.14,
            "bool_val": true,
            "none_val": null,
            "empty_str": "",
        })
    }

    // ── single values ───────────────────────────────────────────────────

    #[test]
    fn test_int_conversions() {
        assert_eq!(convert_one(json!("42"), ConvertType::Int), json!(42));
        assert_eq!(convert_one(json!("3.14"), ConvertType::Int), json!(3));
        assert_eq!(convert_one(json!("-7"), ConvertType::Int), json!(-7));
        assert_eq!(convert_one(json!(true), ConvertType::Int), json!(1));
        assert_eq!(convert_one(json!(9.99), ConvertType::Int), json!(9));
    }

    #[test]
    fn test_float_conversions() {
        assert_eq!(convert_one(json!("3.14"), ConvertType::Float), json!(3.14));
        assert_eq!(convert_one(json!(42), ConvertType::Float), json!(42.0));
        assert_eq!(convert_one(json!(true), ConvertType::Float), json!(1.0));
    }

    #[test]
    fn test_bool_conversions() {
        for truthy in [json!("true"), json!("1"), json!("yes"), json!("on"), json!("TRUE"), json!(1), json!(3.14)] {
            assert_eq!(convert_one(truthy.clone(), ConvertType::Bool), json!(true), "{truthy}");
        }
        for falsy in [json!("false"), json!("0"), json!("nope"), json!(0)] {
            assert_eq!(convert_one(falsy.clone(), ConvertType::Bool), json!(false), "{falsy}");
        }
    }

    #[test]
    fn test_date_and_datetime() {
        assert_eq!(convert_one(json!("2024-12-25"), ConvertType::Date), json!("2024-12-25"));
        assert_eq!(
            convert_one(json!("2024-12-25T15:30:45"), ConvertType::Datetime),
            json!("2024-12-25T15:30:45")
        );
        assert_eq!(
            convert_one(json!("2024-12-25 15:30:45"), ConvertType::Datetime),
            json!("2024-12-25T15:30:45")
        );
        assert_eq!(
            convert_one(json!("2024-12-25"), ConvertType::Datetime),
            json!("2024-12-25T00:00:00")
        );
    }

    #[test]
    fn test_timestamp_formats() {
        for input in [json!("1735056631"), json!(TS)] {
            assert_eq!(convert_one(input.clone(), ConvertType::TimestampToIso), json!("2024-12-24T16:10:31"));
            assert_eq!(convert_one(input.clone(), ConvertType::Timestamp), json!("2024-12-24T16:10:31"));
            assert_eq!(convert_one(input.clone(), ConvertType::TimestampToIsoDate), json!("2024-12-24"));
            assert_eq!(convert_one(input.clone(), ConvertType::TimestampToIsoYyyyMm), json!("2024-12"));
            assert_eq!(convert_one(input, ConvertType::TimestampToIsoYyyy), json!("2024"));
        }
    }

    #[test]
    fn test_fractional_timestamp() {
        assert_eq!(
            convert_one(json!(1_735_056_631.5), ConvertType::TimestampToIso),
            json!("2024-12-24T16:10:31.500")
        );
    }

    #[test]
    fn test_str_conversions() {
        assert_eq!(convert_one(json!(42), ConvertType::Str), json!("42"));
        assert_eq!(convert_one(json!(true), ConvertType::Str), json!("true"));
        assert_eq!(convert_one(json!(3.14), ConvertType::Str), json!("3.14"));
    }

    // ── records ─────────────────────────────────────────────────────────

    #[test]
    fn test_null_and_empty_strings() {
        let s = schema(&[("none_val", ConvertType::Int), ("empty_str", ConvertType::Int)]);
        let kept = convert_dict_types(&conversion_data(), &s, &ConvertOptions::default()).unwrap();
        assert_eq!(kept["none_val"], Value::Null);
        assert_eq!(kept["empty_str"], json!(""));

        let opts = ConvertOptions {
            empty_string_to_none: true,
            ..ConvertOptions::default()
        };
        let nulled = convert_dict_types(&conversion_data(), &s, &opts).unwrap();
        assert_eq!(nulled["empty_str"], Value::Null);
    }

    #[test]
    fn test_unknown_keys_untouched() {
        let s = schema(&[("str_int", ConvertType::Int)]);
        let out = convert_dict_types(&conversion_data(), &s, &ConvertOptions::default()).unwrap();
        assert_eq!(out["str_int"], json!(42));
        assert_eq!(out["str_float"], json!("3.14"));
        assert_eq!(out["str_bool_true"], json!("true"));
    }

    #[test_log::test]
    fn test_recursive_vs_flat() {
        let data = json!({
            "top_level": "42",
            "nested": {"inner_val": "3.14", "deep_nested": {"deep_val": "true"}},
            "items": [{"value": "100"}, {"value": "200"}, {"nested": {"value": "300"}}],
        });
        let s = schema(&[
            ("top_level", ConvertType::Int),
            ("inner_val", ConvertType::Float),
            ("deep_val", ConvertType::Bool),
            ("value", ConvertType::Int),
        ]);

        let flat = convert_dict_types(&data, &s, &ConvertOptions::default()).unwrap();
        assert_eq!(flat["top_level"], json!(42));
        assert_eq!(flat["nested"]["inner_val"], json!("3.14"));
        assert_eq!(flat["items"][0]["value"], json!("100"));

        let opts = ConvertOptions {
            recursive: true,
            ..ConvertOptions::default()
        };
        let deep = convert_dict_types(&data, &s, &opts).unwrap();
        assert_eq!(deep["nested"]["inner_val"], json!(3.14));
        assert_eq!(deep["nested"]["deep_nested"]["deep_val"], json!(true));
        assert_eq!(deep["items"][0]["value"], json!(100));
        assert_eq!(deep["items"][2]["nested"]["value"], json!(300));
    }

    #[test]
    fn test_custom_datetime_formats() {
        let data = json!({"dt_custom": "25/12/2024 15:30", "dt_iso": "2024-12-25T15:30:45", "dt_standard": "2024-12-25"});
        let s = schema(&[
            ("dt_custom", ConvertType::Datetime),
            ("dt_iso", ConvertType::Datetime),
            ("dt_standard", ConvertType::Datetime),
        ]);
        let opts = ConvertOptions {
            datetime_formats: vec!["%d/%m/%Y %H:%M".into(), "%Y-%m-%dT%H:%M:%S".into(), "%Y-%m-%d".into()],
            ..ConvertOptions::default()
        };
        let out = convert_dict_types(&data, &s, &opts).unwrap();
        assert_eq!(out["dt_custom"], json!("2024-12-25T15:30:00"));
        assert_eq!(out["dt_iso"], json!("2024-12-25T15:30:45"));
        assert_eq!(out["dt_standard"], json!("2024-12-25T00:00:00"));
    }

    #[test]
    fn test_ads_api_record() {
        let data = json!({
            "date_start": "2025-08-27",
            "impressions": "42",
            "spend": "0.100697",
            "is_active": "true",
            "updated_timestamp": TS,
            "empty_field": "",
            "actions": [
                {"action_type": "add_to_wishlist", "value": "2"},
                {"action_type": "omni_add_to_cart", "value": "1"},
            ],
        });
        let s = schema(&[
            ("date_start", ConvertType::Date),
            ("impressions", ConvertType::Int),
            ("spend", ConvertType::Float),
            ("is_active", ConvertType::Bool),
            ("updated_timestamp", ConvertType::TimestampToIso),
            ("value", ConvertType::Int),
        ]);
        let opts = ConvertOptions {
            recursive: true,
            ..ConvertOptions::default()
        };
        let out = convert_dict_types(&data, &s, &opts).unwrap();
        assert_eq!(out["impressions"], json!(42));
        assert_eq!(out["spend"], json!(0.100697));
        assert_eq!(out["is_active"], json!(true));
        assert_eq!(out["updated_timestamp"], json!("2024-12-24T16:10:31"));
        assert_eq!(out["empty_field"], json!(""));
        assert_eq!(out["actions"][0]["value"], json!(2));
        assert_eq!(out["actions"][1]["value"], json!(1));
    }

    // ── failures ────────────────────────────────────────────────────────

    #[test]
    fn test_lenient_keeps_original() {
        assert_eq!(convert_one(json!("abc"), ConvertType::Int), json!("abc"));
        assert_eq!(convert_one(json!("not-a-date"), ConvertType::Date), json!("not-a-date"));
        assert_eq!(convert_one(json!("soon"), ConvertType::Datetime), json!("soon"));
    }

    #[test]
    fn test_strict_reports_key_and_target() {
        let s = schema(&[("count", ConvertType::Int)]);
        let opts = ConvertOptions {
            strict: true,
            ..ConvertOptions::default()
        };
        let err = convert_dict_types(&json!({"count": "abc"}), &s, &opts).unwrap_err();
        match err {
            StructureError::Conversion { key, target, .. } => {
                assert_eq!(key, "count");
                assert_eq!(target, "int");
            }
            other => panic!("expected Conversion, got {other:?}"),
        }
    }

    #[test]
    fn test_type_names_round_trip() {
        for name in ["int", "timestamp_to_iso_YYYY-MM", "timestamp_to_iso_YYYY", "str"] {
            let t: ConvertType = name.parse().unwrap();
            assert_eq!(t.as_str(), name);
        }
        assert!("integer".parse::<ConvertType>().is_err());
        let parsed: ConvertType = serde_json::from_value(json!("timestamp_to_iso_date")).unwrap();
        assert_eq!(parsed, ConvertType::TimestampToIsoDate);
    }
}
