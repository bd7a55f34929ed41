//! Runtime configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{GlKitError, Result};
use crate::types::BufferUsage;

pub const ENV_DEBUG: &str = "GLKIT_DEBUG";
pub const ENV_DEFAULT_USAGE: &str = "GLKIT_DEFAULT_USAGE";
pub const ENV_KEEP_GENERATIONS: &str = "GLKIT_KEEP_GENERATIONS";

/// glkit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitConfig {
    /// Return detailed errors. When off, errors are redacted to their kind.
    pub debug: bool,
    /// Usage hint for buffers created without one.
    pub default_usage: BufferUsage,
    /// Generations [`crate::GlKit::reset_default`] keeps.
    pub keep_generations: u64,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            debug: cfg!(debug_assertions),
            default_usage: BufferUsage::StaticDraw,
            keep_generations: 1,
        }
    }
}

impl KitConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| GlKitError::validation(format!("invalid glkit configuration: {e}")))
    }

    /// Defaults overlaid with the `GLKIT_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup` (keyed by the `GLKIT_*` names).
    /// Unparseable values are logged and ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(ENV_DEBUG) {
            match parse_flag(&value) {
                Some(debug) => self.debug = debug,
                None => warn!(key = ENV_DEBUG, %value, "ignoring invalid configuration value"),
            }
        }
        if let Some(value) = lookup(ENV_DEFAULT_USAGE) {
            match value.parse::<BufferUsage>() {
                Ok(usage) => self.default_usage = usage,
                Err(_) => warn!(key = ENV_DEFAULT_USAGE, %value, "ignoring invalid configuration value"),
            }
        }
        if let Some(value) = lookup(ENV_KEEP_GENERATIONS) {
            match value.trim().parse::<u64>() {
                Ok(keep) => self.keep_generations = keep,
                Err(_) => warn!(key = ENV_KEEP_GENERATIONS, %value, "ignoring invalid configuration value"),
            }
        }
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = KitConfig::default();
        assert_eq!(config.default_usage, BufferUsage::StaticDraw);
        assert_eq!(config.keep_generations, 1);
    }

    #[test]
    fn test_from_json_partial() {
        let config = KitConfig::from_json(r#"{ "debug": false, "default_usage": "dynamic_draw" }"#).unwrap();
        assert!(!config.debug);
        assert_eq!(config.default_usage, BufferUsage::DynamicDraw);
        assert_eq!(config.keep_generations, 1);
    }

    #[test]
    fn test_from_json_rejects_unknown_usage() {
        assert!(KitConfig::from_json(r#"{ "default_usage": "often" }"#).is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DEBUG, "off"),
            (ENV_DEFAULT_USAGE, "stream_draw"),
            (ENV_KEEP_GENERATIONS, "not a number"),
        ]
        .into_iter()
        .collect();
        let config = KitConfig::default().with_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert!(!config.debug);
        assert_eq!(config.default_usage, BufferUsage::StreamDraw);
        // invalid value leaves the default
        assert_eq!(config.keep_generations, 1);
    }
}
