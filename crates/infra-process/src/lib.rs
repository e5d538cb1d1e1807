// Forklift Infrastructure - Process Adapters
// Implements: ProcessLauncher (both strategies), MemoryProbe

#[cfg(unix)]
pub mod fork_exec_launcher;
pub mod memory_probe_impl;
mod process_control;
pub mod spawn_launcher;

#[cfg(unix)]
pub use fork_exec_launcher::ForkExecLauncher;
pub use memory_probe_impl::SysinfoMemoryProbe;
pub use spawn_launcher::SpawnLauncher;

use std::sync::Arc;

use forklift_core::application::LaunchService;
use forklift_core::config::LauncherConfig;
use forklift_core::port::id_provider::UuidProvider;
use forklift_core::port::time_provider::SystemTimeProvider;
use forklift_core::port::{ProcessLauncher, TimeProvider};

/// Wire a `LaunchService` with the platform adapters.
///
/// Off unix there is no duplicate-then-replace primitive, so both strategy
/// slots get the direct-spawn adapter and AUTO resolution becomes a no-op.
pub fn build_service(config: LauncherConfig) -> LaunchService {
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let direct_spawn: Arc<dyn ProcessLauncher> =
        Arc::new(SpawnLauncher::new(time_provider.clone()));

    #[cfg(unix)]
    let fork_exec: Arc<dyn ProcessLauncher> =
        Arc::new(ForkExecLauncher::new(time_provider.clone()));
    #[cfg(not(unix))]
    let fork_exec = direct_spawn.clone();

    LaunchService::new(
        config,
        fork_exec,
        direct_spawn,
        Arc::new(SysinfoMemoryProbe::new()),
        time_provider,
        Arc::new(UuidProvider),
    )
}
