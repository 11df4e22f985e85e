// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batch of Line Protocol records for a single write.
//!
//! A batch is bound to one database, retention policy and consistency level.
//! It lives for one delivery attempt and is never retried.

/// Retention policy every batch is written to.
pub const DEFAULT_RETENTION_POLICY: &str = "autogen";

/// Write consistency requested from the cluster: acknowledged by all
/// replicas.
pub const WRITE_CONSISTENCY: &str = "all";

/// Points accumulated for one database write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPoints {
    database: String,
    retention_policy: String,
    lines: Vec<String>,
}

impl BatchPoints {
    /// Create an empty batch for `database` with the default retention
    /// policy.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            retention_policy: DEFAULT_RETENTION_POLICY.to_string(),
            lines: Vec::new(),
        }
    }

    /// Add an encoded line.
    pub fn point(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn retention_policy(&self) -> &str {
        &self.retention_policy
    }

    pub fn consistency(&self) -> &'static str {
        WRITE_CONSISTENCY
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Get the current number of buffered lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Request body: one line per point, newline separated.
    pub fn to_body(&self) -> String {
        self.lines.join("\n")
    }
}
