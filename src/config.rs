//! Configuration for skkbridge
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Main configuration for a skkbridge server instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address (host:port)
    pub listen_addr: String,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,

    /// Pause after a failed accept before trying again (milliseconds)
    pub accept_backoff_ms: u64,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Persisted cache file, one `created_at \t reading \t conversion` per line
    pub cache_path: PathBuf,

    /// Seconds a cached conversion stays fresh
    pub cache_ttl_secs: u64,

    // -------------------------------------------------------------------------
    // Remote Lookup Configuration
    // -------------------------------------------------------------------------
    /// Transliteration endpoint queried on a cache miss
    pub endpoint: String,

    /// Upper bound on a single remote lookup (milliseconds)
    pub lookup_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:1178".to_string(),
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            accept_backoff_ms: 50,
            cache_path: PathBuf::from("./skkbridge_cache.tsv"),
            cache_ttl_secs: crate::cache::DEFAULT_TTL_SECS,
            endpoint: "http://www.google.com/transliterate".to_string(),
            lookup_timeout_ms: 10_000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Remote lookup timeout as a `Duration`
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Accept failure backoff as a `Duration`
    pub fn accept_backoff(&self) -> Duration {
        Duration::from_millis(self.accept_backoff_ms)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            return Err(BridgeError::Config("listen address is empty".to_string()));
        }
        if self.cache_ttl_secs == 0 {
            return Err(BridgeError::Config(
                "cache TTL must be at least one second".to_string(),
            ));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(BridgeError::Config(
                "lookup timeout must be non-zero".to_string(),
            ));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(BridgeError::Config(format!(
                "endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the read timeout (in milliseconds, 0 disables it)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds, 0 disables it)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the pause after a failed accept (in milliseconds)
    pub fn accept_backoff_ms(mut self, ms: u64) -> Self {
        self.config.accept_backoff_ms = ms;
        self
    }

    /// Set the persisted cache file
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_path = path.into();
        self
    }

    /// Set the cache freshness window (in seconds)
    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.config.cache_ttl_secs = secs;
        self
    }

    /// Set the transliteration endpoint
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    /// Set the remote lookup timeout (in milliseconds)
    pub fn lookup_timeout_ms(mut self, ms: u64) -> Self {
        self.config.lookup_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
