// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host-facing metrics consumer.
//!
//! Implements the three lifecycle hooks the host calls: `prepare` once,
//! `handle_data_points` per reporting cycle, `cleanup` at shutdown.
//! Delivery failures never leave this module: they are logged and the
//! cycle's data is dropped, so the host keeps running while InfluxDB is
//! unreachable.

use crate::config::{self, ConfigMap, SinkSettings};
use crate::context::{CycleContext, TaskInfo};
use crate::dispatcher::Dispatcher;
use crate::transport::{Connector, HttpConnector};
use crate::value::DataPoint;
use log::{debug, warn};

/// Forwards every reporting cycle to InfluxDB.
pub struct MetricsConsumer<C: Connector + Clone = HttpConnector> {
    connector: C,
    topology_name: String,
    dispatcher: Option<Dispatcher<C>>,
}

impl MetricsConsumer<HttpConnector> {
    pub fn new() -> Self {
        Self::with_connector(HttpConnector)
    }
}

impl Default for MetricsConsumer<HttpConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector + Clone> MetricsConsumer<C> {
    /// Create a consumer that opens connections through `connector`.
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            topology_name: String::new(),
            dispatcher: None,
        }
    }

    /// One-time setup.
    ///
    /// Merges the topology configuration with the registration argument
    /// (the latter wins), builds the dispatcher and tries to connect. A failed
    /// connection is only logged; every cycle connects again.
    pub fn prepare(&mut self, topology_conf: &ConfigMap, registration_argument: Option<&ConfigMap>) {
        if topology_conf.is_empty() {
            warn!("Topology configuration is empty");
        } else {
            debug!("Topology configuration: {:?}", topology_conf);
        }

        let empty = ConfigMap::new();
        let registration = match registration_argument {
            Some(arg) if !arg.is_empty() => {
                debug!("Registration argument: {:?}", arg);
                arg
            }
            _ => {
                warn!("Registration argument is empty or missing");
                &empty
            }
        };

        self.cleanup();

        let merged = config::merge(topology_conf, registration);
        self.topology_name = config::topology_name(&merged);

        let mut dispatcher = Dispatcher::new(SinkSettings::from_config(&merged), self.connector.clone());
        if let Err(e) = dispatcher.connect() {
            warn!("Unable to connect to InfluxDB at '{}': {}", dispatcher.settings().url, e);
        }
        self.dispatcher = Some(dispatcher);
    }

    /// Forward one reporting cycle. Never fails: errors are logged and the
    /// cycle's data is dropped.
    pub fn handle_data_points(&mut self, task_info: &TaskInfo, data_points: &[DataPoint]) {
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            warn!(
                "Consumer not prepared, dropping {} data point(s)",
                data_points.len()
            );
            return;
        };

        let ctx = CycleContext::new(&self.topology_name, task_info);
        match dispatcher.dispatch_cycle(&ctx, data_points) {
            Ok(written) => debug!(
                "Delivered {} point(s) from {}:{}",
                written, task_info.src_component_id, task_info.src_task_id
            ),
            Err(e) => warn!(
                "Lost connection to InfluxDB, the collected data will be lost: {}",
                e
            ),
        }
    }

    /// Release the connection. Safe to call more than once.
    pub fn cleanup(&mut self) {
        if let Some(mut dispatcher) = self.dispatcher.take() {
            dispatcher.disconnect();
        }
    }

    pub fn topology_name(&self) -> &str {
        &self.topology_name
    }

    pub fn dispatcher(&self) -> Option<&Dispatcher<C>> {
        self.dispatcher.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> ConfigMap {
        match value {
            serde_json::Value::Object(m) => m,
            other => panic!("expected object, got {}", other),
        }
    }

    fn task() -> TaskInfo {
        TaskInfo {
            src_worker_host: "localhost".to_string(),
            src_worker_port: 6700,
            src_component_id: "spout".to_string(),
            src_task_id: 1,
            timestamp: 1,
            update_interval_secs: 10,
        }
    }

    #[test]
    fn test_prepare_merges_configuration() {
        let topology = map(json!({
            "topology.name": "Some-Storm-Topology-Name-12-3456789101",
            "metrics.influxdb.database": "topology-db"
        }));
        let registration = map(json!({
            "metrics.influxdb.url": "http://127.0.0.1:1",
            "metrics.influxdb.database": "registration-db",
            "metrics.influxdb.measurement.prefix": "test-prefix"
        }));

        let mut consumer = MetricsConsumer::new();
        consumer.prepare(&topology, Some(&registration));

        assert_eq!(consumer.topology_name(), "Some-Storm-Topology-Name-12-3456789101");
        let settings = consumer.dispatcher().expect("prepared").settings();
        assert_eq!(settings.database, "registration-db");
        assert_eq!(settings.measurement_prefix, "test-prefix");
        assert_eq!(settings.url, "http://127.0.0.1:1");
        assert!(consumer.dispatcher().expect("prepared").is_connected());
    }

    #[test]
    fn test_prepare_with_nothing_uses_defaults() {
        let mut consumer = MetricsConsumer::new();
        consumer.prepare(&ConfigMap::new(), None);

        assert_eq!(consumer.topology_name(), "");
        assert_eq!(
            consumer.dispatcher().expect("prepared").settings(),
            &SinkSettings::default()
        );
    }

    #[test]
    fn test_prepare_with_invalid_url_does_not_fail() {
        let registration = map(json!({ "metrics.influxdb.url": "::not-a-url::" }));

        let mut consumer = MetricsConsumer::new();
        consumer.prepare(&ConfigMap::new(), Some(&registration));
        assert!(!consumer.dispatcher().expect("prepared").is_connected());

        // Cycles fail quietly
        consumer.handle_data_points(&task(), &[DataPoint::new("cpu", 0.5)]);
        assert_eq!(consumer.dispatcher().expect("prepared").stats().cycles_failed, 1);
    }

    #[test]
    fn test_handle_before_prepare_is_ignored() {
        let mut consumer = MetricsConsumer::new();
        consumer.handle_data_points(&task(), &[DataPoint::new("cpu", 0.5)]);
        assert!(consumer.dispatcher().is_none());
    }

    #[test]
    fn test_cleanup_releases_dispatcher() {
        let mut consumer = MetricsConsumer::new();
        consumer.prepare(&ConfigMap::new(), None);
        assert!(consumer.dispatcher().is_some());

        consumer.cleanup();
        assert!(consumer.dispatcher().is_none());

        // Second cleanup is a no-op
        consumer.cleanup();
    }
}
