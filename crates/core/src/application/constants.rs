// Launcher constants (no magic values)

/// Resident-memory threshold at/above which AUTO prefers direct-spawn (MiB)
pub const DEFAULT_AUTO_MEMORY_THRESHOLD_MB: u64 = 512;

/// Grace period between SIGTERM and SIGKILL escalation (5 seconds)
pub const DEFAULT_GRACEFUL_TIMEOUT_MS: i64 = 5000;

/// Poll interval while waiting for a signalled child to exit (100ms)
pub const GRACEFUL_POLL_INTERVAL_MS: u64 = 100;
