// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the metrics sink.

use thiserror::Error;

/// Errors that can occur while configuring or delivering metrics.
///
/// None of these ever reach the host framework: the consumer logs them and
/// drops the affected cycle.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// The InfluxDB URL could not be parsed.
    #[error("invalid InfluxDB URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// An operation that needs a live connection was called while unconnected.
    #[error("not connected to InfluxDB")]
    NotConnected,

    /// The HTTP request failed before a response was received.
    ///
    /// Built through `From`, which strips the request URL.
    #[error("HTTP transport error: {0}")]
    Http(#[source] reqwest::Error),

    /// InfluxDB answered with a non-success status.
    #[error("InfluxDB returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// I/O failure (compression, file loading).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failed.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<reqwest::Error> for SinkError {
    fn from(e: reqwest::Error) -> Self {
        SinkError::Http(e.without_url())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SinkError>;
