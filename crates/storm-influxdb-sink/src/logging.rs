// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logger initialization for hosts that do not install their own.
//!
//! The sink only emits through the `log` facade. Hosts that already
//! configured a logger must not call these.

use log::{LevelFilter, SetLoggerError};

/// Initialize console logging at `level`.
///
/// Fails if a logger is already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init()
}

/// Initialize console logging from `RUST_LOG`, falling back to
/// `default_level` when it is unset.
pub fn init_from_env(default_level: LevelFilter) -> Result<(), SetLoggerError> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level.to_string()),
    )
    .format_timestamp_millis()
    .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let _ = init(LevelFilter::Debug);
        assert!(init(LevelFilter::Info).is_err());
        assert!(init_from_env(LevelFilter::Warn).is_err());
    }
}
