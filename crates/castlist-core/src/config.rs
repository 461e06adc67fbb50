//! Runtime configuration loaded from TOML.
//!
//! Every field has a default, so an empty document is a valid configuration.
//! Unknown keys are rejected rather than ignored.

use crate::{MAX_TOKEN_CHARS, access::CachePolicy};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

///
/// CastlistConfig
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CastlistConfig {
    pub navigation: NavigationConfig,
    pub paging: PagingConfig,
    pub cache: CacheConfig,
    pub menu: MenuConfig,
}

impl CastlistConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;

        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = self.navigation.max_token_chars;
        if max == 0 || max > MAX_TOKEN_CHARS {
            return Err(ConfigError::invalid(
                "navigation.max_token_chars",
                format!("must be within 1..={MAX_TOKEN_CHARS}, got {max}"),
            ));
        }

        if self.paging.page_size == 0 {
            return Err(ConfigError::invalid("paging.page_size", "must be at least 1"));
        }

        let ratio = self.cache.warm_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::invalid(
                "cache.warm_ratio",
                format!("must be within 0.0..=1.0, got {ratio}"),
            ));
        }

        if self.cache.fetch_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "cache.fetch_timeout_ms",
                "must be at least 1",
            ));
        }

        if self.menu.max_entries == 0 {
            return Err(ConfigError::invalid("menu.max_entries", "must be at least 1"));
        }

        Ok(())
    }

    #[must_use]
    pub const fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            warm_ratio: self.cache.warm_ratio,
            fetch_timeout: Duration::from_millis(self.cache.fetch_timeout_ms),
        }
    }
}

///
/// NavigationConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationConfig {
    /// Hard cap on encoded token length, in characters.
    pub max_token_chars: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_token_chars: MAX_TOKEN_CHARS,
        }
    }
}

///
/// PagingConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagingConfig {
    pub page_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self { page_size: 25 }
    }
}

///
/// CacheConfig
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Minimum cached/known membership ratio that skips a refresh.
    pub warm_ratio: f64,
    pub fetch_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            warm_ratio: 0.8,
            fetch_timeout_ms: 10_000,
        }
    }
}

///
/// MenuConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MenuConfig {
    /// Most recent rosters kept when a selection menu must be truncated.
    pub max_entries: usize,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self { max_entries: 25 }
    }
}

///
/// TESTS
///
