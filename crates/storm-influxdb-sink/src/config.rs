// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sink configuration.
//!
//! The host hands over two flat key/value maps: the topology configuration
//! and the consumer's registration argument. They are merged with the
//! registration argument winning, then read into [`SinkSettings`]. Every key
//! is optional and falls back to its default.
//!
//! ```yaml
//! topology.metrics.consumer.register:
//!   - class: "InfluxDBMetricsConsumer"
//!     parallelism.hint: 1
//!     argument:
//!       metrics.influxdb.url: "http://influxdb:8086"
//!       metrics.influxdb.database: "storm"
//!       metrics.influxdb.enable.gzip: true
//! ```

use crate::error::{Result, SinkError};
use log::{info, warn};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Flat configuration map as supplied by the host.
pub type ConfigMap = serde_json::Map<String, Value>;

pub const KEY_INFLUXDB_URL: &str = "metrics.influxdb.url";
pub const KEY_INFLUXDB_USERNAME: &str = "metrics.influxdb.username";
pub const KEY_INFLUXDB_PASSWORD: &str = "metrics.influxdb.password";
pub const KEY_INFLUXDB_DATABASE: &str = "metrics.influxdb.database";
pub const KEY_INFLUXDB_MEASUREMENT_PREFIX: &str = "metrics.influxdb.measurement.prefix";
pub const KEY_INFLUXDB_ENABLE_GZIP: &str = "metrics.influxdb.enable.gzip";
pub const KEY_INFLUXDB_TIMEOUT_MS: &str = "metrics.influxdb.timeout.ms";

/// Topology name key of the topology configuration.
pub const KEY_TOPOLOGY_NAME: &str = "topology.name";

pub const DEFAULT_INFLUXDB_URL: &str = "http://localhost:8089";
pub const DEFAULT_INFLUXDB_USERNAME: &str = "";
pub const DEFAULT_INFLUXDB_PASSWORD: &str = "";
pub const DEFAULT_INFLUXDB_DATABASE: &str = "apache-storm-metrics";
pub const DEFAULT_INFLUXDB_MEASUREMENT_PREFIX: &str = "storm-";
pub const DEFAULT_INFLUXDB_ENABLE_GZIP: bool = true;
pub const DEFAULT_INFLUXDB_TIMEOUT_MS: u64 = 10_000;

/// Resolved sink settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSettings {
    /// InfluxDB URL (e.g., "http://localhost:8086").
    pub url: String,
    pub username: String,
    pub password: String,
    /// Target database, created on first delivery.
    pub database: String,
    /// Prepended to every measurement name.
    pub measurement_prefix: String,
    /// Gzip request bodies.
    pub enable_gzip: bool,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_INFLUXDB_URL.to_string(),
            username: DEFAULT_INFLUXDB_USERNAME.to_string(),
            password: DEFAULT_INFLUXDB_PASSWORD.to_string(),
            database: DEFAULT_INFLUXDB_DATABASE.to_string(),
            measurement_prefix: DEFAULT_INFLUXDB_MEASUREMENT_PREFIX.to_string(),
            enable_gzip: DEFAULT_INFLUXDB_ENABLE_GZIP,
            timeout: Duration::from_millis(DEFAULT_INFLUXDB_TIMEOUT_MS),
        }
    }
}

impl SinkSettings {
    /// Read settings from a (merged) configuration map.
    pub fn from_config(config: &ConfigMap) -> Self {
        Self {
            url: string_or_default(config, KEY_INFLUXDB_URL, DEFAULT_INFLUXDB_URL),
            username: string_or_default(config, KEY_INFLUXDB_USERNAME, DEFAULT_INFLUXDB_USERNAME),
            password: string_or_default(config, KEY_INFLUXDB_PASSWORD, DEFAULT_INFLUXDB_PASSWORD),
            database: string_or_default(config, KEY_INFLUXDB_DATABASE, DEFAULT_INFLUXDB_DATABASE),
            measurement_prefix: string_or_default(
                config,
                KEY_INFLUXDB_MEASUREMENT_PREFIX,
                DEFAULT_INFLUXDB_MEASUREMENT_PREFIX,
            ),
            enable_gzip: bool_or_default(config, KEY_INFLUXDB_ENABLE_GZIP, DEFAULT_INFLUXDB_ENABLE_GZIP),
            timeout: Duration::from_millis(u64_or_default(
                config,
                KEY_INFLUXDB_TIMEOUT_MS,
                DEFAULT_INFLUXDB_TIMEOUT_MS,
            )),
        }
    }
}

/// Merge two maps; keys of `overrides` replace those of `base`.
pub fn merge(base: &ConfigMap, overrides: &ConfigMap) -> ConfigMap {
    let mut merged = base.clone();
    for (k, v) in overrides {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// Parse a flat YAML mapping.
pub fn from_yaml(yaml: &str) -> Result<ConfigMap> {
    if yaml.trim().is_empty() {
        return Ok(ConfigMap::new());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(ConfigMap::new()),
        other => Err(SinkError::Config(format!(
            "expected a mapping at the top level, found {}",
            json_type(&other)
        ))),
    }
}

/// Parse a flat YAML mapping from a file.
pub fn from_file(path: &Path) -> Result<ConfigMap> {
    let content = std::fs::read_to_string(path)?;
    from_yaml(&content)
}

/// Topology name from the topology configuration, empty if absent.
pub fn topology_name(config: &ConfigMap) -> String {
    match config.get(KEY_TOPOLOGY_NAME) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn string_or_default(config: &ConfigMap, key: &str, default: &str) -> String {
    match config.get(key) {
        None | Some(Value::Null) => {
            info!("Using default parameter for {}", key);
            default.to_string()
        }
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => {
            warn!(
                "Ignoring {} of type {}, using default parameter",
                key,
                json_type(other)
            );
            default.to_string()
        }
    }
}

fn bool_or_default(config: &ConfigMap, key: &str, default: bool) -> bool {
    match config.get(key) {
        None | Some(Value::Null) => {
            info!("Using default parameter for {}", key);
            default
        }
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
        Some(other) => {
            warn!("Ignoring {} = {}, expected a boolean", key, other);
            default
        }
    }
}

fn u64_or_default(config: &ConfigMap, key: &str, default: u64) -> u64 {
    let parsed = match config.get(key) {
        None | Some(Value::Null) => {
            info!("Using default parameter for {}", key);
            return default;
        }
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    parsed.unwrap_or_else(|| {
        warn!("Ignoring {}, expected a non-negative integer", key);
        default
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn map(value: Value) -> ConfigMap {
        match value {
            Value::Object(m) => m,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings = SinkSettings::from_config(&ConfigMap::new());

        assert_eq!(settings.url, "http://localhost:8089");
        assert_eq!(settings.username, "");
        assert_eq!(settings.password, "");
        assert_eq!(settings.database, "apache-storm-metrics");
        assert_eq!(settings.measurement_prefix, "storm-");
        assert!(settings.enable_gzip);
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings, SinkSettings::default());
    }

    #[test]
    fn test_all_parameters_set() {
        let config = map(json!({
            "metrics.influxdb.url": "http://localhost:8086",
            "metrics.influxdb.database": "test-database",
            "metrics.influxdb.username": "test-username",
            "metrics.influxdb.password": "test-password",
            "metrics.influxdb.measurement.prefix": "test-prefix",
            "metrics.influxdb.enable.gzip": true,
            "metrics.influxdb.timeout.ms": 2500
        }));

        let settings = SinkSettings::from_config(&config);
        assert_eq!(settings.url, "http://localhost:8086");
        assert_eq!(settings.database, "test-database");
        assert_eq!(settings.username, "test-username");
        assert_eq!(settings.password, "test-password");
        assert_eq!(settings.measurement_prefix, "test-prefix");
        assert!(settings.enable_gzip);
        assert_eq!(settings.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_gzip_accepts_string_values() {
        let off = map(json!({ "metrics.influxdb.enable.gzip": "FALSE" }));
        assert!(!SinkSettings::from_config(&off).enable_gzip);

        let junk = map(json!({ "metrics.influxdb.enable.gzip": "maybe" }));
        assert!(SinkSettings::from_config(&junk).enable_gzip);
    }

    #[test]
    fn test_wrong_types_fall_back() {
        let config = map(json!({
            "metrics.influxdb.url": ["a", "b"],
            "metrics.influxdb.password": 1234,
            "metrics.influxdb.timeout.ms": -5
        }));

        let settings = SinkSettings::from_config(&config);
        assert_eq!(settings.url, DEFAULT_INFLUXDB_URL);
        assert_eq!(settings.password, "1234");
        assert_eq!(settings.timeout, Duration::from_millis(DEFAULT_INFLUXDB_TIMEOUT_MS));
    }

    #[test]
    fn test_merge_second_overrides_first() {
        let topology = map(json!({
            "topology.name": "wordcount",
            "metrics.influxdb.database": "from-topology",
            "metrics.influxdb.url": "http://topology:8086"
        }));
        let registration = map(json!({
            "metrics.influxdb.database": "from-registration"
        }));

        let merged = merge(&topology, &registration);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged["metrics.influxdb.database"], "from-registration");
        assert_eq!(merged["metrics.influxdb.url"], "http://topology:8086");
        assert_eq!(topology_name(&merged), "wordcount");
    }

    #[test]
    fn test_topology_name_missing() {
        assert_eq!(topology_name(&ConfigMap::new()), "");
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
metrics.influxdb.url: "http://influx.example.com:8086"
metrics.influxdb.database: telemetry
metrics.influxdb.enable.gzip: false
metrics.influxdb.timeout.ms: 500
"#;
        let config = from_yaml(yaml).expect("parse yaml");
        let settings = SinkSettings::from_config(&config);

        assert_eq!(settings.url, "http://influx.example.com:8086");
        assert_eq!(settings.database, "telemetry");
        assert!(!settings.enable_gzip);
        assert_eq!(settings.timeout, Duration::from_millis(500));
        assert_eq!(settings.measurement_prefix, "storm-");
    }

    #[test]
    fn test_from_yaml_empty_document() {
        assert!(from_yaml("").expect("parse").is_empty());
    }

    #[test]
    fn test_from_yaml_rejects_non_mapping() {
        match from_yaml("- a\n- b\n") {
            Err(SinkError::Config(msg)) => assert!(msg.contains("array")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "metrics.influxdb.measurement.prefix: \"prod-\"").expect("write");

        let config = from_file(file.path()).expect("load");
        assert_eq!(SinkSettings::from_config(&config).measurement_prefix, "prod-");
    }

    #[test]
    fn test_from_file_missing() {
        let result = from_file(Path::new("/nonexistent/storm-influxdb.yaml"));
        assert!(matches!(result, Err(SinkError::Io(_))));
    }
}
