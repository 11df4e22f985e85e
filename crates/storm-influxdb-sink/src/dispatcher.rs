// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batch dispatcher.
//!
//! Owns the connection to InfluxDB, turns normalized points into Line
//! Protocol records carrying the cycle's tags and fields, and delivers them
//! as one batch per cycle.
//!
//! ```text
//! Unconnected --connect--> Connected --append_point--> BatchOpen
//!      ^                       ^                           |
//!      |                       +-----------send------------+
//!      +--------disconnect---------------------------------+
//! ```
//!
//! The database is created on the first successful `send` and never again.
//! A failed creation is retried on the next cycle.

use crate::batch::BatchPoints;
use crate::config::SinkSettings;
use crate::context::CycleContext;
use crate::error::{Result, SinkError};
use crate::line_protocol::{encode_point, has_line_break, FieldValue, VALUE_FIELD};
use crate::normalize::{flatten, NormalizedPoint};
use crate::transport::{Connector, HttpConnector, Transport};
use crate::value::{DataPoint, Scalar};
use log::{debug, info, warn};
use std::time::{SystemTime, UNIX_EPOCH};

/// Whether the target database is known to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseState {
    /// Not created yet, or the last attempt failed.
    #[default]
    Unknown,
    /// Created by this dispatcher. Never reset.
    Created,
}

/// Cumulative delivery counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    pub cycles_delivered: u64,
    pub cycles_failed: u64,
    pub points_written: u64,
    /// Points that could not be encoded or were lost with a failed cycle.
    pub points_dropped: u64,
}

/// Delivers one batch of points per reporting cycle.
///
/// Not thread-safe by design of its callers: the host delivers one cycle at a
/// time to each consumer instance.
pub struct Dispatcher<C: Connector = HttpConnector> {
    settings: SinkSettings,
    connector: C,
    connection: Option<C::Transport>,
    database: DatabaseState,
    batch: Option<BatchPoints>,
    stats: DispatchStats,
}

impl Dispatcher<HttpConnector> {
    /// Create a dispatcher using the HTTP transport.
    pub fn http(settings: SinkSettings) -> Self {
        Self::new(settings, HttpConnector)
    }
}

impl<C: Connector> Dispatcher<C> {
    /// Create an unconnected dispatcher.
    pub fn new(settings: SinkSettings, connector: C) -> Self {
        Self {
            settings,
            connector,
            connection: None,
            database: DatabaseState::Unknown,
            batch: None,
            stats: DispatchStats::default(),
        }
    }

    /// Open the connection unless one is already live.
    pub fn connect(&mut self) -> Result<()> {
        if self.connection.is_some() {
            debug!("InfluxDB connection already available: url='{}'", self.settings.url);
            return Ok(());
        }

        debug!(
            "Preparing connection to InfluxDB: url='{}' username='{}' gzip={}",
            self.settings.url, self.settings.username, self.settings.enable_gzip
        );
        self.connection = Some(self.connector.connect(&self.settings)?);
        Ok(())
    }

    /// Append one point to the pending batch, opening the batch if needed.
    ///
    /// The record is named `prefix + name`, holds `value` in its `value`
    /// field and carries every tag and field of `ctx`. Returns `Ok(false)`
    /// when the value cannot be encoded and was dropped.
    pub fn append_point(&mut self, ctx: &CycleContext, name: &str, value: &Scalar) -> Result<bool> {
        if self.connection.is_none() {
            return Err(SinkError::NotConnected);
        }

        let Some(field) = FieldValue::from_scalar(value) else {
            warn!(
                "Unable to encode value of metric '{}': [value: '{}']",
                name, value
            );
            self.stats.points_dropped += 1;
            return Ok(false);
        };

        let measurement = format!("{}{}", self.settings.measurement_prefix, name);

        // a line break would split the record and InfluxDB would keep the rest
        // of the batch as a partial write
        let unencodable = has_line_break(&measurement)
            || ctx.tags.iter().any(|(k, v)| has_line_break(k) || has_line_break(v))
            || ctx.fields.iter().any(|(k, v)| has_line_break(k) || has_line_break(v));
        if unencodable {
            warn!(
                "Unable to encode metric '{}': line break in name, tags or fields",
                name.escape_debug()
            );
            self.stats.points_dropped += 1;
            return Ok(false);
        }

        let mut fields: Vec<(&str, FieldValue)> = Vec::with_capacity(ctx.fields.len() + 1);
        fields.push((VALUE_FIELD, field));
        fields.extend(
            ctx.fields
                .iter()
                .map(|(k, v)| (k.as_str(), FieldValue::String(v.clone()))),
        );

        let line = encode_point(&measurement, &ctx.tag_pairs(), &fields, now_ns());

        let database = &self.settings.database;
        self.batch
            .get_or_insert_with(|| BatchPoints::new(database.clone()))
            .point(line);
        Ok(true)
    }

    /// Deliver the pending batch.
    ///
    /// Creates the database first if it is not known to exist. An empty
    /// batch is not written. Returns the number of points written.
    pub fn send(&mut self) -> Result<usize> {
        let connection = self.connection.as_mut().ok_or(SinkError::NotConnected)?;

        if self.database == DatabaseState::Unknown {
            debug!("Creating database with name = {}", self.settings.database);
            connection.create_database(&self.settings.database)?;
            self.database = DatabaseState::Created;
        }

        match self.batch.take() {
            Some(batch) if !batch.is_empty() => {
                debug!("Sending points to database = {}", batch.database());
                let count = batch.len();
                if let Err(e) = connection.write(&batch) {
                    self.stats.points_dropped += count as u64;
                    return Err(e);
                }
                self.stats.points_written += count as u64;
                Ok(count)
            }
            _ => {
                warn!("No point values to send");
                Ok(0)
            }
        }
    }

    /// Drop the pending batch, returning how many points it held.
    pub fn discard_batch(&mut self) -> usize {
        let lost = self.batch.take().map_or(0, |b| b.len());
        self.stats.points_dropped += lost as u64;
        lost
    }

    /// Release the connection. Does nothing when already unconnected.
    pub fn disconnect(&mut self) {
        let pending = self.discard_batch();
        if pending > 0 {
            warn!("Disconnecting with {} unsent point(s), they are lost", pending);
        }

        match self.connection.take() {
            Some(mut connection) => {
                debug!("Closing connection to database = {}", self.settings.database);
                connection.close();
            }
            None => debug!("InfluxDB connection already closed"),
        }
    }

    /// Run one complete cycle: connect, flatten and append every data point,
    /// send, disconnect.
    ///
    /// On error the pending points are discarded and the error returned.
    /// The connection is released in both cases.
    pub fn dispatch_cycle(&mut self, ctx: &CycleContext, data_points: &[DataPoint]) -> Result<usize> {
        let result = self.run_cycle(ctx, data_points);

        match &result {
            Ok(_) => self.stats.cycles_delivered += 1,
            Err(_) => {
                self.stats.cycles_failed += 1;
                self.discard_batch();
            }
        }
        self.disconnect();
        result
    }

    fn run_cycle(&mut self, ctx: &CycleContext, data_points: &[DataPoint]) -> Result<usize> {
        self.connect()?;

        for dp in data_points {
            if dp.value.is_null() {
                info!("Discarding data point '{}': value is null", dp.name);
                continue;
            }

            let mut failure = None;
            flatten(&dp.name, &dp.value, 0, &mut |point: NormalizedPoint| {
                if failure.is_none() {
                    if let Err(e) = self.append_point(ctx, &point.measurement, &point.value) {
                        failure = Some(e);
                    }
                }
            });
            if let Some(e) = failure {
                return Err(e);
            }
        }

        self.send()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn database_state(&self) -> DatabaseState {
        self.database
    }

    /// Number of points waiting in the open batch.
    pub fn pending_points(&self) -> usize {
        self.batch.as_ref().map_or(0, |b| b.len())
    }

    pub fn settings(&self) -> &SinkSettings {
        &self.settings
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}

fn now_ns() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_nanos()).ok())
}
