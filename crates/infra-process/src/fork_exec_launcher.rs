// Fork-exec launcher (unix only)
// Duplicates the caller, then immediately replaces the duplicate's program
// image. Nothing caller-supplied can run in the duplicate: the window
// between duplication and replacement is confined to redirection plumbing
// inside this module.
//
// Safety contract for the duplicate:
// - every allocation happens before the fork (argv/env are prebuilt CStrings)
// - between fork and exec the child only calls async-signal-safe primitives
//   (chdir, dup2, write, _exit) plus the final exec
// - on any failure the child reports (stage, errno) over a close-on-exec
//   pipe and _exits; it never returns into caller code

use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::{CString, OsString};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::sync::Arc;
use tracing::debug;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execvp, execvpe, fork, pipe2, ForkResult, Pid};

use forklift_core::domain::{
    LaunchRequest, LaunchResult, StdinPolicy, StreamPolicy, TerminationStatus,
};
use forklift_core::error::LaunchError;
use forklift_core::port::{ChildSignal, LaunchedChild, ProcessLauncher, TimeProvider};

use crate::process_control;

const STAGE_CHDIR: u8 = 1;
const STAGE_REDIRECT: u8 = 2;
const STAGE_EXEC: u8 = 3;

/// Duplicate-then-replace launcher built on fork + exec.
pub struct ForkExecLauncher {
    time_provider: Arc<dyn TimeProvider>,
}

impl ForkExecLauncher {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }
}

/// Everything the duplicate needs, allocated before the fork
struct PreparedExec {
    program: CString,
    argv: Vec<CString>,
    /// None inherits the caller's environment via execvp
    envp: Option<Vec<CString>>,
    current_dir: Option<CString>,
}

impl PreparedExec {
    fn from_request(request: &LaunchRequest) -> Result<Self, LaunchError> {
        let program = to_cstring(request.program.as_bytes())?;
        let argv = request
            .argv
            .iter()
            .map(|arg| to_cstring(arg.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        let envp = request
            .env_overrides
            .as_ref()
            .map(|overrides| build_envp(overrides))
            .transpose()?;
        let current_dir = request
            .current_dir
            .as_ref()
            .map(|dir| to_cstring(dir.as_os_str().as_bytes()))
            .transpose()?;

        Ok(Self {
            program,
            argv,
            envp,
            current_dir,
        })
    }
}

fn to_cstring(bytes: &[u8]) -> Result<CString, LaunchError> {
    CString::new(bytes.to_vec())
        .map_err(|_| LaunchError::InvalidRequest("embedded NUL byte".to_string()))
}

/// Overlay the overrides on the inherited environment and render K=V pairs
fn build_envp(overrides: &HashMap<String, String>) -> Result<Vec<CString>, LaunchError> {
    let mut merged: HashMap<OsString, OsString> = std::env::vars_os().collect();
    for (key, value) in overrides {
        merged.insert(OsString::from(key), OsString::from(value));
    }

    merged
        .into_iter()
        .map(|(key, value)| {
            let mut bytes = key.into_vec();
            bytes.push(b'=');
            bytes.extend_from_slice(value.as_bytes());
            to_cstring(&bytes)
        })
        .collect()
}

/// dup2 pairs (source, stdio target) applied in the duplicate before exec
struct RedirectPlan {
    dup2_pairs: Vec<(RawFd, RawFd)>,
}

impl RedirectPlan {
    fn build(
        request: &LaunchRequest,
        stdout_write: Option<&OwnedFd>,
        stderr_write: Option<&OwnedFd>,
        null: Option<&std::fs::File>,
    ) -> Self {
        let null_fd = null.map(|f| f.as_raw_fd());
        let mut dup2_pairs = Vec::new();

        if matches!(request.stdin, StdinPolicy::Null) {
            if let Some(fd) = null_fd {
                dup2_pairs.push((fd, 0));
            }
        }
        match request.stdout {
            StreamPolicy::Capture => {
                if let Some(fd) = stdout_write {
                    dup2_pairs.push((fd.as_raw_fd(), 1));
                }
            }
            StreamPolicy::Null => {
                if let Some(fd) = null_fd {
                    dup2_pairs.push((fd, 1));
                }
            }
            StreamPolicy::Inherit => {}
        }
        match request.stderr {
            StreamPolicy::Capture => {
                if let Some(fd) = stderr_write {
                    dup2_pairs.push((fd.as_raw_fd(), 2));
                }
            }
            StreamPolicy::Null => {
                if let Some(fd) = null_fd {
                    dup2_pairs.push((fd, 2));
                }
            }
            StreamPolicy::Inherit => {}
        }

        Self { dup2_pairs }
    }
}

#[async_trait]
impl ProcessLauncher for ForkExecLauncher {
    async fn launch(
        &self,
        request: &LaunchRequest,
    ) -> Result<Box<dyn LaunchedChild>, LaunchError> {
        let started_at = self.time_provider.now_millis();
        let prepared = PreparedExec::from_request(request)?;

        // Capture pipes and the status pipe are close-on-exec: the child
        // side survives only as the dup2 targets, and exec success shows up
        // in the parent as plain EOF on the status pipe.
        let stdout_pipe = make_capture_pipe(request.stdout)?;
        let stderr_pipe = make_capture_pipe(request.stderr)?;
        let (status_read, status_write) =
            pipe2(OFlag::O_CLOEXEC).map_err(|e| LaunchError::Io(format!("status pipe: {}", e)))?;
        let null = open_null_if_needed(request)?;

        let plan = RedirectPlan::build(
            request,
            stdout_pipe.as_ref().map(|(_, w)| w),
            stderr_pipe.as_ref().map(|(_, w)| w),
            null.as_ref(),
        );

        // reason: fork+exec immediately; the duplicate never runs caller code
        match unsafe { fork() } {
            Ok(ForkResult::Child) => exec_in_child(&prepared, &plan, status_write.as_raw_fd()),
            Ok(ForkResult::Parent { child }) => {
                let pid = child.as_raw();

                // Drop our copies of the child-side descriptors so capture
                // reads can reach EOF and the status pipe closes on exec.
                drop(status_write);
                drop(null);
                let stdout_read = stdout_pipe.map(|(r, w)| {
                    drop(w);
                    r
                });
                let stderr_read = stderr_pipe.map(|(r, w)| {
                    drop(w);
                    r
                });

                let report = tokio::task::spawn_blocking(move || read_exec_report(status_read))
                    .await
                    .map_err(|e| LaunchError::Io(format!("status pipe task: {}", e)))?
                    .map_err(|e| LaunchError::Io(format!("status pipe read: {}", e)))?;

                if let Some((stage, errno)) = report {
                    // The duplicate never ran the target. Reap it before
                    // surfacing the error: no lingering process remains.
                    let _ = tokio::task::spawn_blocking(move || {
                        waitpid(Pid::from_raw(pid), None)
                    })
                    .await;
                    return Err(map_child_failure(stage, errno, &request.program));
                }

                debug!(pid = pid, program = %request.program, "Fork-exec child running");

                Ok(Box::new(ForkedChild {
                    pid,
                    stdout_read,
                    stderr_read,
                    started_at,
                    time_provider: self.time_provider.clone(),
                }))
            }
            Err(Errno::EAGAIN) | Err(Errno::ENOMEM) => Err(LaunchError::ResourceExhausted(
                "fork: process table or memory limit reached".to_string(),
            )),
            Err(e) => Err(LaunchError::Io(format!("fork: {}", e))),
        }
    }

    async fn signal(&self, pid: i32, signal: ChildSignal) -> Result<(), LaunchError> {
        process_control::deliver_signal(pid, signal)
    }

    fn is_alive(&self, pid: i32) -> bool {
        process_control::probe_alive(pid)
    }
}

fn make_capture_pipe(policy: StreamPolicy) -> Result<Option<(OwnedFd, OwnedFd)>, LaunchError> {
    if policy != StreamPolicy::Capture {
        return Ok(None);
    }
    pipe2(OFlag::O_CLOEXEC)
        .map(Some)
        .map_err(|e| LaunchError::Io(format!("capture pipe: {}", e)))
}

fn open_null_if_needed(request: &LaunchRequest) -> Result<Option<std::fs::File>, LaunchError> {
    let needed = matches!(request.stdin, StdinPolicy::Null)
        || request.stdout == StreamPolicy::Null
        || request.stderr == StreamPolicy::Null;
    if !needed {
        return Ok(None);
    }
    std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .map(Some)
        .map_err(|e| LaunchError::Io(format!("/dev/null: {}", e)))
}

/// Runs in the duplicate. Redirect, chdir, exec - or report and _exit.
fn exec_in_child(prepared: &PreparedExec, plan: &RedirectPlan, status_fd: RawFd) -> ! {
    if let Some(dir) = &prepared.current_dir {
        if unsafe { libc::chdir(dir.as_ptr()) } != 0 {
            report_and_exit(status_fd, STAGE_CHDIR, Errno::last() as i32);
        }
    }

    // Redirection happens after creation and strictly before image
    // replacement; dup2 clears close-on-exec on the stdio targets while the
    // originals still close at exec.
    for (src, dst) in &plan.dup2_pairs {
        if unsafe { libc::dup2(*src, *dst) } < 0 {
            report_and_exit(status_fd, STAGE_REDIRECT, Errno::last() as i32);
        }
    }

    let err = match &prepared.envp {
        Some(envp) => execvpe(&prepared.program, &prepared.argv, envp),
        None => execvp(&prepared.program, &prepared.argv),
    }
    .unwrap_err();

    report_and_exit(status_fd, STAGE_EXEC, err as i32)
}

fn report_and_exit(status_fd: RawFd, stage: u8, errno: i32) -> ! {
    let mut buf = [0u8; 5];
    buf[0] = stage;
    buf[1..5].copy_from_slice(&errno.to_le_bytes());
    unsafe {
        libc::write(status_fd, buf.as_ptr() as *const libc::c_void, buf.len());
        libc::_exit(127);
    }
}

/// Blocks until exec (EOF) or a failure report from the duplicate
fn read_exec_report(status_read: OwnedFd) -> std::io::Result<Option<(u8, i32)>> {
    use std::io::Read;

    let mut file = std::fs::File::from(status_read);
    let mut buf = [0u8; 5];
    let mut filled = 0;

    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    if filled < buf.len() {
        // EOF without a report: exec replaced the image
        return Ok(None);
    }
    let errno = i32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]);
    Ok(Some((buf[0], errno)))
}

fn map_child_failure(stage: u8, errno: i32, program: &str) -> LaunchError {
    let errno = Errno::from_raw(errno);
    match stage {
        STAGE_EXEC => match errno {
            Errno::ENOENT | Errno::EACCES | Errno::ENOEXEC | Errno::ENOTDIR => {
                LaunchError::ExecutableNotFound(program.to_string())
            }
            Errno::EAGAIN | Errno::ENOMEM => {
                LaunchError::ResourceExhausted(errno.desc().to_string())
            }
            other => LaunchError::Io(format!("exec failed: {}", other.desc())),
        },
        STAGE_CHDIR => LaunchError::Io(format!("chdir failed: {}", errno.desc())),
        _ => LaunchError::Io(format!("stdio redirection failed: {}", errno.desc())),
    }
}

struct ForkedChild {
    pid: i32,
    stdout_read: Option<OwnedFd>,
    stderr_read: Option<OwnedFd>,
    started_at: i64,
    time_provider: Arc<dyn TimeProvider>,
}

impl std::fmt::Debug for ForkedChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForkedChild")
            .field("pid", &self.pid)
            .field("stdout_read", &self.stdout_read)
            .field("stderr_read", &self.stderr_read)
            .field("started_at", &self.started_at)
            .finish()
    }
}

#[async_trait]
impl LaunchedChild for ForkedChild {
    fn pid(&self) -> i32 {
        self.pid
    }

    async fn wait(self: Box<Self>) -> Result<LaunchResult, LaunchError> {
        let pid = self.pid;

        // Drain captures concurrently with the reap: a child blocked on a
        // full pipe buffer must still be able to exit.
        let stdout_task = self
            .stdout_read
            .map(|fd| tokio::task::spawn_blocking(move || drain_pipe(fd)));
        let stderr_task = self
            .stderr_read
            .map(|fd| tokio::task::spawn_blocking(move || drain_pipe(fd)));
        let reap_task = tokio::task::spawn_blocking(move || reap(pid));

        let status = reap_task
            .await
            .map_err(|e| LaunchError::WaitFailed(format!("reap task: {}", e)))??;
        let stdout = collect_capture(stdout_task).await?;
        let stderr = collect_capture(stderr_task).await?;

        let finished_at = self.time_provider.now_millis();

        Ok(LaunchResult {
            pid,
            status,
            duration_ms: finished_at - self.started_at,
            stdout,
            stderr,
        })
    }
}

/// waitpid on this specific pid; EINTR is retried, never surfaced
fn reap(pid: i32) -> Result<TerminationStatus, LaunchError> {
    loop {
        match waitpid(Pid::from_raw(pid), None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(TerminationStatus::Exited(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Ok(TerminationStatus::Signaled(signal as i32))
            }
            Ok(other) => {
                return Err(LaunchError::WaitFailed(format!(
                    "unexpected wait status: {:?}",
                    other
                )))
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(LaunchError::WaitFailed(e.desc().to_string())),
        }
    }
}

async fn collect_capture(
    task: Option<tokio::task::JoinHandle<std::io::Result<Vec<u8>>>>,
) -> Result<Option<Vec<u8>>, LaunchError> {
    match task {
        None => Ok(None),
        Some(task) => task
            .await
            .map_err(|e| LaunchError::Io(format!("capture task: {}", e)))?
            .map(Some)
            .map_err(|e| LaunchError::Io(format!("capture read: {}", e))),
    }
}

fn drain_pipe(fd: OwnedFd) -> std::io::Result<Vec<u8>> {
    use std::io::Read;

    let mut file = std::fs::File::from(fd);
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}
