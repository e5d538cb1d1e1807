// Direct-spawn launcher
// The platform creates the child directly; no duplicated intermediate
// process is ever visible to caller code.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Child;
use tracing::debug;

use forklift_core::domain::{
    LaunchRequest, LaunchResult, StdinPolicy, StreamPolicy, TerminationStatus,
};
use forklift_core::error::LaunchError;
use forklift_core::port::{ChildSignal, LaunchedChild, ProcessLauncher, TimeProvider};

use crate::process_control;

/// Direct-spawn launcher built on the runtime's process API.
///
/// Preferred when the caller's resident footprint is large: creation never
/// duplicates the caller's page-table bookkeeping.
pub struct SpawnLauncher {
    time_provider: Arc<dyn TimeProvider>,
}

impl SpawnLauncher {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    fn stdio_for(policy: StreamPolicy) -> Stdio {
        match policy {
            StreamPolicy::Inherit => Stdio::inherit(),
            StreamPolicy::Capture => Stdio::piped(),
            StreamPolicy::Null => Stdio::null(),
        }
    }

    fn build_command(request: &LaunchRequest) -> std::process::Command {
        let mut command = std::process::Command::new(&request.program);
        command.args(request.argv_tail());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            if let Some(argv0) = request.argv.first() {
                command.arg0(argv0);
            }
        }

        // Overlay semantics: envs() adds to the inherited environment
        if let Some(env) = &request.env_overrides {
            command.envs(env);
        }
        if let Some(dir) = &request.current_dir {
            command.current_dir(dir);
        }

        command.stdin(match request.stdin {
            StdinPolicy::Inherit => Stdio::inherit(),
            StdinPolicy::Null => Stdio::null(),
        });
        command.stdout(Self::stdio_for(request.stdout));
        command.stderr(Self::stdio_for(request.stderr));

        command
    }
}

#[async_trait]
impl ProcessLauncher for SpawnLauncher {
    async fn launch(
        &self,
        request: &LaunchRequest,
    ) -> Result<Box<dyn LaunchedChild>, LaunchError> {
        let started_at = self.time_provider.now_millis();

        let mut command = tokio::process::Command::from(Self::build_command(request));
        let child = command
            .spawn()
            .map_err(|e| LaunchError::from_spawn_error(&request.program, &e))?;

        let pid = child
            .id()
            .map(|id| id as i32)
            .ok_or_else(|| LaunchError::Io("child pid unavailable after spawn".to_string()))?;

        debug!(pid = pid, program = %request.program, "Direct-spawn created child");

        Ok(Box::new(SpawnedChild {
            pid,
            child,
            started_at,
            time_provider: self.time_provider.clone(),
            capture_stdout: request.stdout == StreamPolicy::Capture,
            capture_stderr: request.stderr == StreamPolicy::Capture,
        }))
    }

    async fn signal(&self, pid: i32, signal: ChildSignal) -> Result<(), LaunchError> {
        process_control::deliver_signal(pid, signal)
    }

    fn is_alive(&self, pid: i32) -> bool {
        process_control::probe_alive(pid)
    }
}

struct SpawnedChild {
    pid: i32,
    child: Child,
    started_at: i64,
    time_provider: Arc<dyn TimeProvider>,
    capture_stdout: bool,
    capture_stderr: bool,
}

impl std::fmt::Debug for SpawnedChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnedChild")
            .field("pid", &self.pid)
            .field("started_at", &self.started_at)
            .field("capture_stdout", &self.capture_stdout)
            .field("capture_stderr", &self.capture_stderr)
            .finish()
    }
}

#[async_trait]
impl LaunchedChild for SpawnedChild {
    fn pid(&self) -> i32 {
        self.pid
    }

    async fn wait(self: Box<Self>) -> Result<LaunchResult, LaunchError> {
        // wait_with_output drains both pipes concurrently with the reap, so
        // a child flooding one stream cannot deadlock against us.
        let output = self
            .child
            .wait_with_output()
            .await
            .map_err(|e| LaunchError::WaitFailed(e.to_string()))?;

        let finished_at = self.time_provider.now_millis();
        let status = termination_status(&output.status)?;

        Ok(LaunchResult {
            pid: self.pid,
            status,
            duration_ms: finished_at - self.started_at,
            stdout: self.capture_stdout.then_some(output.stdout),
            stderr: self.capture_stderr.then_some(output.stderr),
        })
    }
}

fn termination_status(status: &std::process::ExitStatus) -> Result<TerminationStatus, LaunchError> {
    if let Some(code) = status.code() {
        return Ok(TerminationStatus::Exited(code));
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Ok(TerminationStatus::Signaled(signal));
        }
    }

    Err(LaunchError::WaitFailed(format!(
        "child ended without exit code or signal: {}",
        status
    )))
}
