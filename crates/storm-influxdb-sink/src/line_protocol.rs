// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB Line Protocol encoding.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v1/write_protocols/line_protocol_reference/>

use crate::value::Scalar;
use std::fmt;

/// Name of the field holding a point's own value.
pub const VALUE_FIELD: &str = "value";

/// A value that can be stored in an InfluxDB field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Boolean value.
    Boolean(bool),
}

impl FieldValue {
    /// Select the field encoding for a scalar.
    ///
    /// Integers are widened to floats so a measurement's `value` field keeps
    /// one type no matter which numeric width the metric reported. Integers
    /// above 2^53 lose precision. Returns `None` for non-finite floats, which
    /// Line Protocol cannot represent.
    pub fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::String(s) => Some(FieldValue::String(s.clone())),
            Scalar::Bool(b) => Some(FieldValue::Boolean(*b)),
            Scalar::Int(i) => Some(FieldValue::Float(*i as f64)),
            Scalar::Float(v) if v.is_finite() => Some(FieldValue::Float(*v)),
            Scalar::Float(_) => None,
        }
    }

    /// Format this value for InfluxDB Line Protocol.
    ///
    /// - Float: written as-is (e.g., `3.14`)
    /// - String: quoted with double quotes, inner quotes escaped (e.g., `"hello"`)
    /// - Boolean: `true` or `false`
    pub fn to_line_protocol(&self) -> String {
        match self {
            FieldValue::Float(v) => format!("{}", v),
            FieldValue::String(v) => {
                let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{}\"", escaped)
            }
            FieldValue::Boolean(v) => v.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_line_protocol())
    }
}

/// Encode a single point as one Line Protocol line.
///
/// Tags are written sorted by key. Tags with an empty value are omitted,
/// InfluxDB rejects them. Without a timestamp the server assigns one.
pub fn encode_point(
    measurement: &str,
    tags: &[(&str, &str)],
    fields: &[(&str, FieldValue)],
    timestamp_ns: Option<u64>,
) -> String {
    debug_assert!(!fields.is_empty(), "InfluxDB requires at least one field");

    let mut line = escape_measurement(measurement);

    let mut sorted_tags: Vec<_> = tags.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted_tags.sort_by_key(|(k, _)| *k);
    for (key, value) in &sorted_tags {
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    line.push(' ');

    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&value.to_line_protocol());
    }

    if let Some(ts) = timestamp_ns {
        line.push(' ');
        line.push_str(&ts.to_string());
    }

    line
}

/// Whether `s` holds a `\n` or `\r`.
///
/// Line breaks cannot be escaped outside quoted string fields; a record
/// containing one would be split into two lines.
pub fn has_line_break(s: &str) -> bool {
    s.contains(['\n', '\r'])
}

/// Spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Tag keys, tag values and field keys share the same rules:
/// commas, equals signs, and spaces must be escaped.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
