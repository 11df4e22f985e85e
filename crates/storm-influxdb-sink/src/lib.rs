// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Storm InfluxDB Sink
//!
//! Forwards Apache Storm metrics to InfluxDB, one batch per reporting cycle.
//!
//! This crate provides:
//! - Flattening of nested metric values into typed leaf points (bounded depth)
//! - Per-cycle tags (component, topology) and fields (task, worker, timing)
//! - InfluxDB Line Protocol encoding and batched writes over HTTP, optionally gzipped
//! - Lazy, once-only database creation
//! - Best-effort delivery: a failed cycle is logged and dropped, never propagated
//!
//! # Overview
//!
//! ```text
//! DataPoint --> normalize::flatten --> Dispatcher::append_point --> BatchPoints --> Transport
//!                                            ^
//!                                      CycleContext (tags + fields)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use storm_influxdb_sink::{config, DataPoint, MetricsConsumer, TaskInfo};
//!
//! let registration = config::from_yaml(r#"
//! metrics.influxdb.url: "http://localhost:8086"
//! metrics.influxdb.database: "storm"
//! "#).expect("valid yaml");
//!
//! let mut consumer = MetricsConsumer::new();
//! consumer.prepare(&config::ConfigMap::new(), Some(&registration));
//!
//! let task = TaskInfo {
//!     src_worker_host: "worker-1".into(),
//!     src_worker_port: 6700,
//!     src_component_id: "split".into(),
//!     src_task_id: 3,
//!     timestamp: 1_700_000_000,
//!     update_interval_secs: 60,
//! };
//! consumer.handle_data_points(&task, &[DataPoint::new("emitted", 120)]);
//! consumer.cleanup();
//! ```

pub mod batch;
pub mod config;
pub mod consumer;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod line_protocol;
pub mod logging;
pub mod normalize;
pub mod transport;
pub mod value;

pub use config::SinkSettings;
pub use consumer::MetricsConsumer;
pub use context::{CycleContext, TaskInfo};
pub use dispatcher::{DatabaseState, Dispatcher};
pub use error::SinkError;
pub use value::{DataPoint, MetricValue, Scalar};
