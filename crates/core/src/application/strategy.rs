//! Strategy resolution - pure decision over the configured strategy and a
//! probe reading. No platform calls happen here.

use crate::domain::SpawnStrategy;

/// Concrete strategy after AUTO resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedStrategy {
    ForkExec,
    DirectSpawn,
}

impl std::fmt::Display for ResolvedStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedStrategy::ForkExec => write!(f, "FORK_EXEC"),
            ResolvedStrategy::DirectSpawn => write!(f, "DIRECT_SPAWN"),
        }
    }
}

/// Resolve the configured strategy against the caller's resident memory.
///
/// Duplicating a caller with a large resident set pays for its page-table
/// bookkeeping even when the pages themselves are never copied, so AUTO
/// prefers direct-spawn at or above the threshold. Both strategies remain
/// correct at any footprint; nothing downstream may treat this choice as an
/// invariant.
pub fn resolve(
    strategy: SpawnStrategy,
    resident_memory_mb: u64,
    threshold_mb: u64,
) -> ResolvedStrategy {
    match strategy {
        SpawnStrategy::ForkExec => ResolvedStrategy::ForkExec,
        SpawnStrategy::DirectSpawn => ResolvedStrategy::DirectSpawn,
        SpawnStrategy::Auto => {
            if resident_memory_mb >= threshold_mb {
                ResolvedStrategy::DirectSpawn
            } else {
                ResolvedStrategy::ForkExec
            }
        }
    }
}
