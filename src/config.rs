//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_CAPACITY;
use crate::events::{DEFAULT_CACHE_RETENTION, DEFAULT_HEAP_RETENTION};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of links held in the cache
    pub cache_capacity: NonZeroUsize,
    /// Interval between expiry sweeps, in milliseconds
    pub sweep_interval_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Cache-category operation records kept
    pub cache_log_retention: usize,
    /// Heap-category operation records kept
    pub heap_log_retention: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Cached links, zero is ignored (default: 100)
    /// - `SWEEP_INTERVAL_MS` - Sweep period in milliseconds (default: 5000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_LOG_RETENTION` - Cache records kept (default: 100)
    /// - `HEAP_LOG_RETENTION` - Heap records kept (default: 50)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_capacity: env_var("CACHE_CAPACITY").unwrap_or(defaults.cache_capacity),
            sweep_interval_ms: env_var::<u64>("SWEEP_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.sweep_interval_ms),
            server_port: env_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_log_retention: env_var("CACHE_LOG_RETENTION")
                .unwrap_or(defaults.cache_log_retention),
            heap_log_retention: env_var("HEAP_LOG_RETENTION")
                .unwrap_or(defaults.heap_log_retention),
        }
    }

    /// Sweep period as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

fn env_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            sweep_interval_ms: 5000,
            server_port: 3000,
            cache_log_retention: DEFAULT_CACHE_RETENTION,
            heap_log_retention: DEFAULT_HEAP_RETENTION,
        }
    }
}
