// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-cycle context shared by every point of a batch.
//!
//! Tags are indexed by InfluxDB, fields are not. Both are string-valued.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TAG_COMPONENT_ID: &str = "ComponentId";
pub const TAG_TOPOLOGY: &str = "Topology";

pub const FIELD_TIMESTAMP: &str = "Timestamp";
pub const FIELD_UPDATE_INTERVAL_SECS: &str = "UpdateIntervalSecs";
pub const FIELD_TASK_ID: &str = "TaskId";
pub const FIELD_WORKER_HOST: &str = "WorkerHost";
pub const FIELD_WORKER_PORT: &str = "WorkerPort";

/// Origin of a reporting cycle, as described by the host framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub src_worker_host: String,
    pub src_worker_port: u16,
    pub src_component_id: String,
    pub src_task_id: i32,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub update_interval_secs: i32,
}

/// Tags and fields attached to every point written in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleContext {
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, String>,
}

impl CycleContext {
    /// Build the context for a cycle reported by `task` of `topology`.
    pub fn new(topology: &str, task: &TaskInfo) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(TAG_COMPONENT_ID.to_string(), task.src_component_id.clone());
        tags.insert(TAG_TOPOLOGY.to_string(), topology.to_string());

        let mut fields = BTreeMap::new();
        fields.insert(FIELD_TIMESTAMP.to_string(), task.timestamp.to_string());
        fields.insert(
            FIELD_UPDATE_INTERVAL_SECS.to_string(),
            task.update_interval_secs.to_string(),
        );
        fields.insert(FIELD_TASK_ID.to_string(), task.src_task_id.to_string());
        fields.insert(FIELD_WORKER_HOST.to_string(), task.src_worker_host.clone());
        fields.insert(FIELD_WORKER_PORT.to_string(), task.src_worker_port.to_string());

        Self { tags, fields }
    }

    /// Tags as borrowed pairs, sorted by key.
    pub fn tag_pairs(&self) -> Vec<(&str, &str)> {
        self.tags
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}
