// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flattening of nested metric values into leaf points.
//!
//! ```text
//! ("latency", {"p50": 1.2, "ops": {"read": 10}})
//!     --> ("p50", 1.2), ("read", 10)
//! ```
//!
//! A leaf is named by its own key only. Ancestor keys are not concatenated,
//! so two branches holding the same key produce points with the same name.

use crate::value::{MetricValue, Scalar};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Deepest nesting level at which values are still processed.
///
/// The entry value itself sits at depth 0; each group adds one level.
pub const MAX_DEPTH: usize = 3;

/// A flattened leaf: measurement name (without prefix) and scalar value.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPoint {
    pub measurement: String,
    pub value: Scalar,
}

/// What `flatten` does with one value at one depth.
#[derive(Debug, PartialEq)]
enum Step<'a> {
    Null,
    TooDeep,
    Group(&'a BTreeMap<String, MetricValue>),
    Leaf(Scalar),
}

fn classify(value: &MetricValue, depth: usize) -> Step<'_> {
    // nulls are discarded at info level whatever their depth
    if value.is_null() {
        return Step::Null;
    }
    if depth > MAX_DEPTH {
        return Step::TooDeep;
    }
    match value {
        MetricValue::Group(entries) => Step::Group(entries),
        leaf => leaf.as_scalar().map_or(Step::Null, Step::Leaf),
    }
}

/// Flatten `value` under `name`, starting at `depth`.
///
/// Each leaf is passed to `emit` as soon as it is found. Values nested
/// deeper than [`MAX_DEPTH`] are dropped together with their descendants.
/// Returns the number of points emitted.
pub fn flatten<F>(name: &str, value: &MetricValue, depth: usize, emit: &mut F) -> usize
where
    F: FnMut(NormalizedPoint),
{
    match classify(value, depth) {
        Step::Null => {
            info!("Discarding metric '{}': value is null", name);
            0
        }
        Step::TooDeep => {
            warn!(
                "Too many nested values in metric '{}' (depth {} > {}), dropping it",
                name, depth, MAX_DEPTH
            );
            0
        }
        Step::Group(entries) => {
            debug!("Processing metric group '{}' ({} entries)", name, entries.len());
            entries
                .iter()
                .map(|(key, nested)| flatten(key, nested, depth + 1, emit))
                .sum()
        }
        Step::Leaf(scalar) => {
            debug!("Processing metric: name='{}' value='{}'", name, scalar);
            emit(NormalizedPoint {
                measurement: name.to_string(),
                value: scalar,
            });
            1
        }
    }
}
