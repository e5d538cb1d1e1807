// Process Launcher Port
// Abstraction over process-creation strategies (fork-exec, direct-spawn)

use crate::domain::{LaunchRequest, LaunchResult};
use crate::error::LaunchError;
use async_trait::async_trait;

/// Signal kinds deliverable to a running child.
///
/// Signal delivery is a separate, explicitly-named operation: cancelling a
/// child is never part of the launch contract itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSignal {
    /// Polite termination request (SIGTERM)
    Terminate,
    /// Immediate, uncatchable kill (SIGKILL)
    Kill,
    /// Interactive interrupt (SIGINT)
    Interrupt,
}

/// Handle to a launched, possibly still running child.
///
/// Waiting consumes the handle: a `LaunchResult` is produced exactly once.
///
/// Resource-leak hazard: if the handle is dropped without waiting and the
/// caller stays alive, the terminated child remains an unreaped
/// process-table record until the caller exits. Launch-and-abandon callers
/// own that hazard; this crate does not hide it behind a global reaper.
#[async_trait]
pub trait LaunchedChild: Send + std::fmt::Debug {
    /// OS process identifier of the child
    fn pid(&self) -> i32;

    /// Block until this child terminates, reap it, and report how it ended.
    ///
    /// Never returns before this child's termination and never reports a
    /// different child's status.
    ///
    /// # Errors
    /// - LaunchError::WaitFailed if the wait primitive itself errors
    async fn wait(self: Box<Self>) -> Result<LaunchResult, LaunchError>;
}

/// Process Launcher trait
///
/// Implementations:
/// - SpawnLauncher: platform creates the child directly
/// - ForkExecLauncher: duplicate the caller, replace the program image
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Start the requested program in a new process.
    ///
    /// On success a new OS process exists, distinct from the caller and
    /// running the requested program; none of the caller's memory is shared
    /// for mutation with it.
    ///
    /// # Errors
    /// - LaunchError::ExecutableNotFound if the program is missing or not executable
    /// - LaunchError::ResourceExhausted if the platform cannot allocate a process
    /// - LaunchError::Io for redirection plumbing failures
    async fn launch(&self, request: &LaunchRequest)
        -> Result<Box<dyn LaunchedChild>, LaunchError>;

    /// Deliver a signal to a running child
    ///
    /// # Errors
    /// - LaunchError::SignalFailed if delivery fails (e.g. no such process)
    async fn signal(&self, pid: i32, signal: ChildSignal) -> Result<(), LaunchError>;

    /// Check whether a process is still alive
    fn is_alive(&self, pid: i32) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::TerminationStatus;
    use std::sync::{Arc, Mutex};

    /// Mock launcher behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Launch succeeds; waiting reports this status
        Succeed(TerminationStatus),
        /// Launch fails with ExecutableNotFound
        NotFound,
        /// Launch fails with ResourceExhausted
        Exhausted,
    }

    /// Mock Process Launcher for testing
    pub struct MockLauncher {
        behavior: Arc<Mutex<MockBehavior>>,
        call_count: Arc<Mutex<usize>>,
        next_pid: Arc<Mutex<i32>>,
    }

    impl MockLauncher {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                call_count: Arc::new(Mutex::new(0)),
                next_pid: Arc::new(Mutex::new(4242)),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Succeed(TerminationStatus::Exited(0)))
        }

        pub fn new_not_found() -> Self {
            Self::new(MockBehavior::NotFound)
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[derive(Debug)]
    struct MockChild {
        pid: i32,
        status: TerminationStatus,
    }

    #[async_trait]
    impl LaunchedChild for MockChild {
        fn pid(&self) -> i32 {
            self.pid
        }

        async fn wait(self: Box<Self>) -> Result<LaunchResult, LaunchError> {
            Ok(LaunchResult {
                pid: self.pid,
                status: self.status,
                duration_ms: 1,
                stdout: None,
                stderr: None,
            })
        }
    }

    #[async_trait]
    impl ProcessLauncher for MockLauncher {
        async fn launch(
            &self,
            request: &LaunchRequest,
        ) -> Result<Box<dyn LaunchedChild>, LaunchError> {
            *self.call_count.lock().unwrap() += 1;

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Succeed(status) => {
                    let mut next_pid = self.next_pid.lock().unwrap();
                    let pid = *next_pid;
                    *next_pid += 1;
                    Ok(Box::new(MockChild { pid, status }))
                }
                MockBehavior::NotFound => {
                    Err(LaunchError::ExecutableNotFound(request.program.clone()))
                }
                MockBehavior::Exhausted => Err(LaunchError::ResourceExhausted(
                    "mock process table full".to_string(),
                )),
            }
        }

        async fn signal(&self, _pid: i32, _signal: ChildSignal) -> Result<(), LaunchError> {
            Ok(())
        }

        fn is_alive(&self, _pid: i32) -> bool {
            false
        }
    }
}
