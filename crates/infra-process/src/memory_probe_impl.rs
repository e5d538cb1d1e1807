// Resident memory probe implementation
// reason: sysinfo for cross-platform process memory readings

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use sysinfo::{Pid, ProcessRefreshKind, System};
use tracing::debug;

use forklift_core::port::MemoryProbe;

/// Memory probe backed by sysinfo.
///
/// Samples the calling process's resident set on demand; keeps one System
/// instance alive so repeated refreshes stay cheap.
pub struct SysinfoMemoryProbe {
    system: Arc<Mutex<System>>,
    pid: Pid,
}

impl SysinfoMemoryProbe {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
            pid: Pid::from_u32(std::process::id()),
        }
    }
}

impl Default for SysinfoMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryProbe for SysinfoMemoryProbe {
    async fn resident_memory_mb(&self) -> u64 {
        let mut sys = self.system.lock().unwrap();
        sys.refresh_process_specifics(self.pid, ProcessRefreshKind::new().with_memory());

        let resident_mb = sys
            .process(self.pid)
            .map(|p| p.memory() / 1024 / 1024)
            .unwrap_or(0);

        debug!(resident_mb = resident_mb, "Resident memory sampled");

        resident_mb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn own_resident_memory_is_nonzero() {
        let probe = SysinfoMemoryProbe::new();
        let resident_mb = probe.resident_memory_mb().await;

        // A running Rust test binary holds at least one MiB resident
        assert!(resident_mb > 0);
    }
}
