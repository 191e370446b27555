//! # Runtime Configuration Module
//!
//! Environment-driven settings for endpoint coroutines.
//!
//! ## Environment Variables
//!
//! ### `BRRTBIND_STACK_SIZE`
//!
//! Stack size for handler coroutines. Accepts decimal (`16384`) or hexadecimal
//! (`0x4000`). Unparseable values fall back to the default.
//!
//! Default: `0x4000` (16 KB)
//!
//! ```rust
//! use brrtbind::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! assert!(config.stack_size > 0);
//! ```

use std::env;

/// Environment variable holding the handler coroutine stack size.
pub const STACK_SIZE_ENV: &str = "BRRTBIND_STACK_SIZE";

/// Default coroutine stack size (16 KB).
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let stack_size = lookup(STACK_SIZE_ENV)
            .and_then(|val| parse_size(val.trim()))
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_STACK_SIZE);
        RuntimeConfig { stack_size }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}
