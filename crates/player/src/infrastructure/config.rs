//! Player configuration
//!
//! Read from the process environment after the binary has loaded `.env`
//! files. Every value has a default; malformed numbers fall back to it.

use std::env;
use std::time::Duration;

use crate::application::activity::DEFAULT_ACTIVITY_LOG_CAPACITY;
use crate::application::reconciler::{
    ReconcilerSettings, DEFAULT_DEBOUNCE_MS, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_RECONNECT_DELAY_MS,
};
use crate::application::DEFAULT_REQUEST_TIMEOUT_MS;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
pub const DEFAULT_ACT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Authority API base, without a trailing slash
    pub api_base: String,
    /// Player credential; requests go out unauthenticated without it
    pub init_data: Option<String>,
    pub request_timeout_ms: u64,
    pub reconnect_delay_ms: u64,
    /// Tick coalescing window
    pub debounce_ms: u64,
    /// Push-channel silence that counts as a dead stream
    pub idle_timeout_ms: u64,
    pub activity_log_capacity: usize,
    /// Act the shop is scoped to
    pub act: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            init_data: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            activity_log_capacity: DEFAULT_ACTIVITY_LOG_CAPACITY,
            act: DEFAULT_ACT,
        }
    }
}

impl PlayerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (the environment, or a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            api_base: lookup("DELVER_API_BASE")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.api_base),
            init_data: lookup("DELVER_INIT_DATA").filter(|v| !v.trim().is_empty()),
            request_timeout_ms: number("DELVER_REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
            reconnect_delay_ms: number("DELVER_RECONNECT_DELAY_MS", defaults.reconnect_delay_ms),
            debounce_ms: number("DELVER_DEBOUNCE_MS", defaults.debounce_ms),
            idle_timeout_ms: number("DELVER_IDLE_TIMEOUT_MS", defaults.idle_timeout_ms)
                .max(1),
            activity_log_capacity: lookup("DELVER_ACTIVITY_LOG_CAPACITY")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.activity_log_capacity),
            act: lookup("DELVER_ACT")
                .and_then(|v| v.trim().parse().ok())
                .filter(|act| *act > 0)
                .unwrap_or(defaults.act),
        }
    }

    pub fn reconciler_settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> PlayerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PlayerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config(&[]);
        assert_eq!(config, PlayerConfig::default());
        assert_eq!(config.api_base, "http://localhost:8000/api");
        assert_eq!(config.request_timeout_ms, 120_000);
        assert_eq!(config.reconnect_delay_ms, 3_000);
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.idle_timeout_ms, 45_000);
        assert_eq!(config.activity_log_capacity, 50);
        assert_eq!(config.act, 1);
        assert!(config.init_data.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("DELVER_API_BASE", "https://game.example/api/"),
            ("DELVER_INIT_DATA", "query_id=7"),
            ("DELVER_DEBOUNCE_MS", "100"),
            ("DELVER_IDLE_TIMEOUT_MS", "60000"),
            ("DELVER_ACT", "3"),
        ]);
        assert_eq!(config.api_base, "https://game.example/api");
        assert_eq!(config.init_data.as_deref(), Some("query_id=7"));
        assert_eq!(config.reconciler_settings().debounce, Duration::from_millis(100));
        assert_eq!(
            config.reconciler_settings().idle_timeout,
            Duration::from_secs(60)
        );
        assert_eq!(config.act, 3);
    }

    #[test]
    fn malformed_values_fall_back() {
        let config = config(&[
            ("DELVER_REQUEST_TIMEOUT_MS", "soon"),
            ("DELVER_ACTIVITY_LOG_CAPACITY", "-4"),
            ("DELVER_ACT", "0"),
            ("DELVER_INIT_DATA", "   "),
        ]);
        assert_eq!(config.request_timeout_ms, 120_000);
        assert_eq!(config.activity_log_capacity, 50);
        assert_eq!(config.act, 1);
        assert!(config.init_data.is_none());
    }
}
