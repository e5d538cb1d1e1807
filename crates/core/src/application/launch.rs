// Launch Use Case
// Validates a request, resolves the strategy, dispatches to one adapter

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::application::constants::GRACEFUL_POLL_INTERVAL_MS;
use crate::application::strategy::{self, ResolvedStrategy};
use crate::config::LauncherConfig;
use crate::domain::{LaunchRequest, LaunchResult, SpawnStrategy};
use crate::error::Result;
use crate::port::{
    ChildSignal, IdProvider, LaunchedChild, MemoryProbe, ProcessLauncher, TimeProvider,
};

/// Launch service: the caller-facing surface of the launcher.
///
/// Stateless across launches. There is no registry of children and no
/// shared mutable state between invocations; two sequential launches of the
/// same request are fully independent. All pending-wait state lives in the
/// returned handle.
pub struct LaunchService {
    config: LauncherConfig,
    fork_exec: Arc<dyn ProcessLauncher>,
    direct_spawn: Arc<dyn ProcessLauncher>,
    memory_probe: Arc<dyn MemoryProbe>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
}

impl LaunchService {
    /// Create a new launch service
    ///
    /// # Arguments
    /// * `config` - strategy selection and timing knobs
    /// * `fork_exec` - duplicate-then-replace adapter
    /// * `direct_spawn` - direct platform-spawn adapter
    /// * `memory_probe` - resident-memory source for AUTO resolution
    /// * `time_provider` / `id_provider` - injected for determinism
    pub fn new(
        config: LauncherConfig,
        fork_exec: Arc<dyn ProcessLauncher>,
        direct_spawn: Arc<dyn ProcessLauncher>,
        memory_probe: Arc<dyn MemoryProbe>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            config,
            fork_exec,
            direct_spawn,
            memory_probe,
            time_provider,
            id_provider,
        }
    }

    /// Start a child and return its handle without waiting.
    ///
    /// The caller and the child run concurrently from the moment this
    /// returns. Waiting is explicit and opt-in via the handle.
    pub async fn launch(&self, request: &LaunchRequest) -> Result<Box<dyn LaunchedChild>> {
        request.validate()?;

        let launch_id = self.id_provider.generate_id();
        let resolved = self.resolve_strategy().await;

        info!(
            launch_id = %launch_id,
            program = %request.program,
            strategy = %resolved,
            "Launching child process"
        );

        let child = self.adapter(resolved).launch(request).await?;

        info!(
            launch_id = %launch_id,
            pid = child.pid(),
            "Child process created"
        );

        Ok(child)
    }

    /// Launch, then wait for termination: the common path
    pub async fn run(&self, request: &LaunchRequest) -> Result<LaunchResult> {
        let child = self.launch(request).await?;
        let pid = child.pid();
        let result = child.wait().await?;

        info!(
            pid = pid,
            status = %result.status,
            duration_ms = result.duration_ms,
            "Child process reaped"
        );

        Ok(result)
    }

    /// Deliver a signal to a running child.
    ///
    /// A distinct concern from launching: the launch contract never cancels.
    pub async fn signal(&self, pid: i32, signal: ChildSignal) -> Result<()> {
        self.controller().signal(pid, signal).await
    }

    /// Check whether a child is still alive
    pub fn is_alive(&self, pid: i32) -> bool {
        self.controller().is_alive(pid)
    }

    /// Terminate with SIGTERM first, then SIGKILL if needed
    pub async fn terminate_graceful(&self, pid: i32) -> Result<()> {
        info!(pid = pid, "Sending SIGTERM for graceful termination");
        self.controller().signal(pid, ChildSignal::Terminate).await?;

        let start_time = self.time_provider.now_millis();
        loop {
            tokio::time::sleep(Duration::from_millis(GRACEFUL_POLL_INTERVAL_MS)).await;

            if !self.controller().is_alive(pid) {
                info!(pid = pid, "Process exited after SIGTERM");
                return Ok(());
            }

            if self.time_provider.now_millis() - start_time > self.config.graceful_timeout_ms {
                warn!(pid = pid, "Process did not exit after SIGTERM, sending SIGKILL");
                return self.controller().signal(pid, ChildSignal::Kill).await;
            }
        }
    }

    async fn resolve_strategy(&self) -> ResolvedStrategy {
        match self.config.strategy {
            SpawnStrategy::Auto => {
                let resident_mb = self.memory_probe.resident_memory_mb().await;
                let resolved = strategy::resolve(
                    SpawnStrategy::Auto,
                    resident_mb,
                    self.config.auto_memory_threshold_mb,
                );
                debug!(
                    resident_mb = resident_mb,
                    threshold_mb = self.config.auto_memory_threshold_mb,
                    strategy = %resolved,
                    "Resolved AUTO strategy"
                );
                resolved
            }
            other => strategy::resolve(other, 0, self.config.auto_memory_threshold_mb),
        }
    }

    fn adapter(&self, resolved: ResolvedStrategy) -> &Arc<dyn ProcessLauncher> {
        match resolved {
            ResolvedStrategy::ForkExec => &self.fork_exec,
            ResolvedStrategy::DirectSpawn => &self.direct_spawn,
        }
    }

    // Signal and liveness share one control path in both adapters; either
    // serves. Delegation pinned to one to keep behavior predictable.
    fn controller(&self) -> &Arc<dyn ProcessLauncher> {
        &self.direct_spawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TerminationStatus;
    use crate::error::LaunchError;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::launcher::mocks::{MockBehavior, MockLauncher};
    use crate::port::memory_probe::mocks::FixedMemoryProbe;
    use crate::port::time_provider::SystemTimeProvider;

    fn service_with(
        strategy: SpawnStrategy,
        resident_mb: u64,
    ) -> (LaunchService, Arc<MockLauncher>, Arc<MockLauncher>) {
        let fork_exec = Arc::new(MockLauncher::new_success());
        let direct_spawn = Arc::new(MockLauncher::new_success());
        let config = LauncherConfig {
            strategy,
            ..LauncherConfig::default()
        };
        let service = LaunchService::new(
            config,
            fork_exec.clone(),
            direct_spawn.clone(),
            Arc::new(FixedMemoryProbe::new(resident_mb)),
            Arc::new(SystemTimeProvider),
            Arc::new(SequentialIdProvider::new()),
        );
        (service, fork_exec, direct_spawn)
    }

    #[tokio::test]
    async fn run_reports_the_mocked_status() {
        let (service, _, _) = service_with(SpawnStrategy::DirectSpawn, 0);
        let request = LaunchRequest::new("/bin/true");

        let result = service.run(&request).await.unwrap();

        assert_eq!(result.status, TerminationStatus::Exited(0));
        assert!(result.pid > 0);
    }

    #[tokio::test]
    async fn auto_dispatches_to_fork_exec_below_threshold() {
        let (service, fork_exec, direct_spawn) = service_with(SpawnStrategy::Auto, 16);

        service.run(&LaunchRequest::new("/bin/true")).await.unwrap();

        assert_eq!(fork_exec.call_count(), 1);
        assert_eq!(direct_spawn.call_count(), 0);
    }

    #[tokio::test]
    async fn auto_dispatches_to_direct_spawn_above_threshold() {
        let (service, fork_exec, direct_spawn) = service_with(SpawnStrategy::Auto, 8192);

        service.run(&LaunchRequest::new("/bin/true")).await.unwrap();

        assert_eq!(fork_exec.call_count(), 0);
        assert_eq!(direct_spawn.call_count(), 1);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_an_adapter() {
        let (service, fork_exec, direct_spawn) = service_with(SpawnStrategy::Auto, 0);
        let mut request = LaunchRequest::new("prog");
        request.argv.clear();

        let err = service.run(&request).await.unwrap_err();

        assert!(matches!(err, LaunchError::InvalidRequest(_)));
        assert_eq!(fork_exec.call_count(), 0);
        assert_eq!(direct_spawn.call_count(), 0);
    }

    #[tokio::test]
    async fn launch_failures_propagate_unchanged() {
        let fork_exec = Arc::new(MockLauncher::new_not_found());
        let direct_spawn = Arc::new(MockLauncher::new(MockBehavior::Exhausted));
        let config = LauncherConfig {
            strategy: SpawnStrategy::ForkExec,
            ..LauncherConfig::default()
        };
        let service = LaunchService::new(
            config,
            fork_exec,
            direct_spawn,
            Arc::new(FixedMemoryProbe::new(0)),
            Arc::new(SystemTimeProvider),
            Arc::new(SequentialIdProvider::new()),
        );

        let err = service
            .run(&LaunchRequest::new("/no/such/program"))
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchError::ExecutableNotFound(p) if p == "/no/such/program"));
    }

    #[tokio::test]
    async fn sequential_launches_share_no_state() {
        let (service, _, direct_spawn) = service_with(SpawnStrategy::DirectSpawn, 0);
        let request = LaunchRequest::new("/bin/true");

        let first = service.run(&request).await.unwrap();
        let second = service.run(&request).await.unwrap();

        assert_eq!(first.status, second.status);
        // Distinct processes, one adapter call each
        assert_ne!(first.pid, second.pid);
        assert_eq!(direct_spawn.call_count(), 2);
    }
}
