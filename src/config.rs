//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Age in seconds after which an entry is treated as absent
    pub max_age_secs: f64,
    /// Background sweep interval in seconds, 0 disables the sweep
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 100)
    /// - `MAX_AGE_SECONDS` - Entry lifetime in seconds, fractional allowed (default: 20)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env::var("MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            max_age_secs: env::var("MAX_AGE_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_age_secs),
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval),
        }
    }

    /// Returns the configured max age as a `Duration`.
    ///
    /// Fails for zero, negative, NaN or infinite values.
    pub fn max_age(&self) -> Result<Duration> {
        if !(self.max_age_secs.is_finite() && self.max_age_secs > 0.0) {
            return Err(CacheError::InvalidMaxAge(format!(
                "must be a positive number of seconds, got {}",
                self.max_age_secs
            )));
        }
        Duration::try_from_secs_f64(self.max_age_secs)
            .map_err(|e| CacheError::InvalidMaxAge(e.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 100,
            max_age_secs: 20.0,
            sweep_interval: 1,
        }
    }
}
