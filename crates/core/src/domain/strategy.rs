// Spawn Strategy - how the child process gets created

use serde::{Deserialize, Serialize};

/// Process-creation strategy.
///
/// The two concrete strategies are observably identical: same result shape,
/// same error taxonomy. The choice is a performance/safety tradeoff, never
/// an observable contract difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpawnStrategy {
    /// Duplicate the caller's process, then immediately replace the
    /// duplicate's program image with the target executable. Nothing runs
    /// in the duplicate between duplication and replacement.
    ForkExec,
    /// Ask the platform to create the new process directly. No intermediate
    /// duplicated-state process is ever visible to caller code.
    DirectSpawn,
    /// Resolve to one of the above at launch time from the caller's
    /// resident memory footprint. Performance heuristic only.
    Auto,
}

impl std::fmt::Display for SpawnStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpawnStrategy::ForkExec => write!(f, "FORK_EXEC"),
            SpawnStrategy::DirectSpawn => write!(f, "DIRECT_SPAWN"),
            SpawnStrategy::Auto => write!(f, "AUTO"),
        }
    }
}

impl std::str::FromStr for SpawnStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fork_exec" => Ok(SpawnStrategy::ForkExec),
            "direct_spawn" => Ok(SpawnStrategy::DirectSpawn),
            "auto" => Ok(SpawnStrategy::Auto),
            other => Err(format!("unknown spawn strategy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_spellings() {
        assert_eq!("fork-exec".parse::<SpawnStrategy>(), Ok(SpawnStrategy::ForkExec));
        assert_eq!("FORK_EXEC".parse::<SpawnStrategy>(), Ok(SpawnStrategy::ForkExec));
        assert_eq!("direct_spawn".parse::<SpawnStrategy>(), Ok(SpawnStrategy::DirectSpawn));
        assert_eq!("Auto".parse::<SpawnStrategy>(), Ok(SpawnStrategy::Auto));
    }

    #[test]
    fn rejects_unknown() {
        assert!("posix_spawn".parse::<SpawnStrategy>().is_err());
    }
}
