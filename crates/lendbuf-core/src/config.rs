//! Pool configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Hard cap (in bytes) on the sum of all outstanding acquisitions. The
    /// pool must *never* exceed this.
    pub max_total_bytes: u64,

    /// Hard cap (in bytes) on the total size of a single acquisition.
    pub max_request_bytes: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_total_bytes: 1024 * 1024 * 1024, // 1 GiB default
            max_request_bytes: 10 * 1024 * 1024, // 10 MiB default
        }
    }
}

impl PoolConfig {
    /// Build a validated configuration.
    pub fn new(max_total_bytes: u64, max_request_bytes: u64) -> Result<Self> {
        let cfg = Self {
            max_total_bytes,
            max_request_bytes,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject out-of-range ceilings. Invalid values are never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.max_total_bytes == 0 {
            return Err(Error::Config("max_total_bytes must be positive".into()));
        }
        if self.max_request_bytes == 0 {
            return Err(Error::Config("max_request_bytes must be positive".into()));
        }
        if self.max_request_bytes > self.max_total_bytes {
            return Err(Error::Config(format!(
                "max_request_bytes ({}) must not exceed max_total_bytes ({})",
                self.max_request_bytes, self.max_total_bytes
            )));
        }
        Ok(())
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `LENDBUF_MAX_TOTAL_BYTES`: global outstanding-bytes ceiling
    /// - `LENDBUF_MAX_REQUEST_BYTES`: per-acquisition ceiling
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("LENDBUF_MAX_TOTAL_BYTES") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.max_total_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("LENDBUF_MAX_REQUEST_BYTES") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.max_request_bytes = v;
            }
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = PoolConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_total_bytes, 1024 * 1024 * 1024);
        assert_eq!(cfg.max_request_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_rejects_zero_ceilings() {
        assert!(PoolConfig::new(0, 0).is_err());
        assert!(PoolConfig::new(100, 0).is_err());
        assert!(PoolConfig::new(0, 100).is_err());
    }

    #[test]
    fn test_rejects_request_ceiling_above_total() {
        let err = PoolConfig::new(100, 200).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_request_ceiling_may_equal_total() {
        let cfg = PoolConfig::new(100, 100).unwrap();
        assert_eq!(cfg.max_request_bytes, 100);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let cfg = PoolConfig::new(8 * 1024, 2 * 1024).unwrap();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: PoolConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_from_env_overrides_defaults() {
        std::env::set_var("LENDBUF_MAX_TOTAL_BYTES", "4096");
        std::env::set_var("LENDBUF_MAX_REQUEST_BYTES", "1024");
        let cfg = PoolConfig::from_env();
        assert_eq!(cfg.max_total_bytes, 4096);
        assert_eq!(cfg.max_request_bytes, 1024);

        // Unparseable values fall back to the defaults
        std::env::set_var("LENDBUF_MAX_TOTAL_BYTES", "not-a-number");
        let cfg = PoolConfig::from_env();
        assert_eq!(cfg.max_total_bytes, PoolConfig::default().max_total_bytes);
        assert_eq!(cfg.max_request_bytes, 1024);

        std::env::remove_var("LENDBUF_MAX_TOTAL_BYTES");
        std::env::remove_var("LENDBUF_MAX_REQUEST_BYTES");
    }
}
