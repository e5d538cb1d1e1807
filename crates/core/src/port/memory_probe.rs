// Resident Memory Probe Port
// reason: async-trait so the sysinfo-backed impl can refresh without blocking callers

use async_trait::async_trait;

/// Probe for the calling process's resident memory footprint.
///
/// Feeds the AUTO strategy heuristic: a large resident set makes
/// duplicating the caller's page-table bookkeeping disproportionately
/// expensive even when the pages themselves are copy-on-write. Readings
/// are advisory and never part of the launch contract.
#[async_trait]
pub trait MemoryProbe: Send + Sync {
    /// Resident set size of the current process, in MiB
    async fn resident_memory_mb(&self) -> u64;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock MemoryProbe reporting a settable fixed value
    pub struct FixedMemoryProbe {
        resident_mb: Arc<Mutex<u64>>,
    }

    impl FixedMemoryProbe {
        pub fn new(resident_mb: u64) -> Self {
            Self {
                resident_mb: Arc::new(Mutex::new(resident_mb)),
            }
        }

        pub fn set_resident_mb(&self, resident_mb: u64) {
            *self.resident_mb.lock().unwrap() = resident_mb;
        }
    }

    #[async_trait]
    impl MemoryProbe for FixedMemoryProbe {
        async fn resident_memory_mb(&self) -> u64 {
            *self.resident_mb.lock().unwrap()
        }
    }
}
