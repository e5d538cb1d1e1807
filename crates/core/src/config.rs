// Launcher Configuration (environment-variable driven)

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::constants::{
    DEFAULT_AUTO_MEMORY_THRESHOLD_MB, DEFAULT_GRACEFUL_TIMEOUT_MS,
};
use crate::domain::SpawnStrategy;

/// Launcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Which creation strategy to use; AUTO resolves per launch
    pub strategy: SpawnStrategy,
    /// Resident-memory threshold AUTO compares against (MiB)
    pub auto_memory_threshold_mb: u64,
    /// Grace period before SIGKILL escalation in terminate_graceful (ms)
    pub graceful_timeout_ms: i64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            strategy: SpawnStrategy::Auto,
            auto_memory_threshold_mb: DEFAULT_AUTO_MEMORY_THRESHOLD_MB,
            graceful_timeout_ms: DEFAULT_GRACEFUL_TIMEOUT_MS,
        }
    }
}

impl LauncherConfig {
    /// Load configuration from environment variables.
    ///
    /// - `FORKLIFT_STRATEGY`: fork_exec | direct_spawn | auto
    /// - `FORKLIFT_AUTO_MEMORY_THRESHOLD_MB`
    /// - `FORKLIFT_GRACEFUL_TIMEOUT_MS`
    ///
    /// Unparseable values fall back to defaults with a logged warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let strategy = match std::env::var("FORKLIFT_STRATEGY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!(value = %raw, error = %e, "Invalid FORKLIFT_STRATEGY, using default");
                defaults.strategy
            }),
            Err(_) => defaults.strategy,
        };

        let auto_memory_threshold_mb = parse_env_or(
            "FORKLIFT_AUTO_MEMORY_THRESHOLD_MB",
            defaults.auto_memory_threshold_mb,
        );
        let graceful_timeout_ms =
            parse_env_or("FORKLIFT_GRACEFUL_TIMEOUT_MS", defaults.graceful_timeout_ms);

        Self {
            strategy,
            auto_memory_threshold_mb,
            graceful_timeout_ms,
        }
    }
}

fn parse_env_or<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(var = name, value = %raw, "Unparseable value, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = LauncherConfig::default();
        assert_eq!(config.strategy, SpawnStrategy::Auto);
        assert_eq!(config.auto_memory_threshold_mb, 512);
        assert_eq!(config.graceful_timeout_ms, 5000);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = LauncherConfig {
            strategy: SpawnStrategy::ForkExec,
            auto_memory_threshold_mb: 64,
            graceful_timeout_ms: 250,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: LauncherConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.strategy, SpawnStrategy::ForkExec);
        assert_eq!(back.auto_memory_threshold_mb, 64);
    }
}
