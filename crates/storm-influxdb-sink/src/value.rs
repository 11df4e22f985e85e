// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Metric values as reported by the host framework.
//!
//! A metric value is either a scalar, a nested group of named values, or
//! null. Groups may nest arbitrarily; the normalizer bounds how deep it
//! follows them.

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single leaf value that can be written to InfluxDB.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// UTF-8 string.
    String(String),
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{}", s),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A metric value: scalar, nested group, or null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Named sub-values. Keys are kept sorted.
    Group(BTreeMap<String, MetricValue>),
    Null,
}

impl MetricValue {
    /// Build a group from `(key, value)` pairs.
    pub fn group<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<MetricValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        MetricValue::Group(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns true for [`MetricValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, MetricValue::Null)
    }

    /// Returns the scalar view of this value, or `None` for groups and null.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            MetricValue::String(s) => Some(Scalar::String(s.clone())),
            MetricValue::Bool(b) => Some(Scalar::Bool(*b)),
            MetricValue::Int(i) => Some(Scalar::Int(*i)),
            MetricValue::Float(v) => Some(Scalar::Float(*v)),
            MetricValue::Group(_) | MetricValue::Null => None,
        }
    }

    /// Convert a JSON value.
    ///
    /// Arrays have no metric representation: they are dropped with a warning
    /// and `None` is returned. Arrays nested inside objects are skipped the
    /// same way without discarding their siblings.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(MetricValue::Null),
            serde_json::Value::Bool(b) => Some(MetricValue::Bool(b)),
            serde_json::Value::String(s) => Some(MetricValue::String(s)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(MetricValue::Int(i))
                } else {
                    // u64 above i64::MAX, or a real float
                    n.as_f64().map(MetricValue::Float)
                }
            }
            serde_json::Value::Object(map) => Some(MetricValue::Group(
                map.into_iter()
                    .filter_map(|(k, v)| match MetricValue::from_json(v) {
                        Some(mv) => Some((k, mv)),
                        None => {
                            warn!("Dropping metric entry '{}': unsupported value type", k);
                            None
                        }
                    })
                    .collect(),
            )),
            serde_json::Value::Array(items) => {
                warn!(
                    "Unsupported metric value type: array of {} element(s)",
                    items.len()
                );
                None
            }
        }
    }
}

impl From<serde_json::Value> for MetricValue {
    fn from(value: serde_json::Value) -> Self {
        MetricValue::from_json(value).unwrap_or(MetricValue::Null)
    }
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(MetricValue::from)
    }
}

impl From<Scalar> for MetricValue {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::String(s) => MetricValue::String(s),
            Scalar::Bool(b) => MetricValue::Bool(b),
            Scalar::Int(i) => MetricValue::Int(i),
            Scalar::Float(v) => MetricValue::Float(v),
        }
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::String(s.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(s: String) -> Self {
        MetricValue::String(s)
    }
}

impl From<bool> for MetricValue {
    fn from(b: bool) -> Self {
        MetricValue::Bool(b)
    }
}

impl From<i32> for MetricValue {
    fn from(i: i32) -> Self {
        MetricValue::Int(i64::from(i))
    }
}

impl From<i64> for MetricValue {
    fn from(i: i64) -> Self {
        MetricValue::Int(i)
    }
}

impl From<f32> for MetricValue {
    fn from(v: f32) -> Self {
        MetricValue::Float(f64::from(v))
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl<T: Into<MetricValue>> From<Option<T>> for MetricValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(MetricValue::Null)
    }
}

/// One named metric reported by the host in a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub name: String,
    pub value: MetricValue,
}

impl DataPoint {
    pub fn new(name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(MetricValue::from(json!("up")), MetricValue::String("up".into()));
        assert_eq!(MetricValue::from(json!(true)), MetricValue::Bool(true));
        assert_eq!(MetricValue::from(json!(42)), MetricValue::Int(42));
        assert_eq!(MetricValue::from(json!(0.25)), MetricValue::Float(0.25));
        assert_eq!(MetricValue::from(json!(null)), MetricValue::Null);
    }

    #[test]
    fn test_from_json_large_unsigned_becomes_float() {
        let v = MetricValue::from(json!(u64::MAX));
        match v {
            MetricValue::Float(f) => assert!(f > 1.8e19),
            other => panic!("expected Float, got {:?}", other),
        }
    }

    #[test]
    fn test_from_json_nested_object() {
        let v = MetricValue::from(json!({
            "host": "a",
            "inner": { "count": 3 }
        }));

        let expected = MetricValue::group([
            ("host", MetricValue::from("a")),
            ("inner", MetricValue::group([("count", 3)])),
        ]);
        assert_eq!(v, expected);
    }

    #[test]
    fn test_from_json_arrays_dropped() {
        assert!(MetricValue::from_json(json!([1, 2, 3])).is_none());
        assert!(MetricValue::from(json!([1, 2, 3])).is_null());

        // Siblings of an array survive
        let v = MetricValue::from(json!({ "list": [1], "ok": 1 }));
        assert_eq!(v, MetricValue::group([("ok", 1)]));
    }

    #[test]
    fn test_data_point_deserialize() {
        let dp: DataPoint =
            serde_json::from_value(json!({ "name": "cpu", "value": 0.42 })).expect("decode");
        assert_eq!(dp, DataPoint::new("cpu", 0.42));

        let dp: DataPoint =
            serde_json::from_value(json!({ "name": "bad", "value": null })).expect("decode");
        assert!(dp.value.is_null());
    }

    #[test]
    fn test_as_scalar() {
        assert_eq!(MetricValue::from(7).as_scalar(), Some(Scalar::Int(7)));
        assert_eq!(MetricValue::Null.as_scalar(), None);
        assert_eq!(MetricValue::group([("a", 1)]).as_scalar(), None);
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<f64> = None;
        assert!(MetricValue::from(none).is_null());
        assert_eq!(MetricValue::from(Some(1.5)), MetricValue::Float(1.5));
    }
}
