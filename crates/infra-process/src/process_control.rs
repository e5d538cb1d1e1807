// Process control shared by both launcher adapters
// Signal delivery and liveness probing by pid

use forklift_core::error::LaunchError;
use forklift_core::port::ChildSignal;

#[cfg(unix)]
pub(crate) fn deliver_signal(pid: i32, signal: ChildSignal) -> Result<(), LaunchError> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let sig = match signal {
        ChildSignal::Terminate => Signal::SIGTERM,
        ChildSignal::Kill => Signal::SIGKILL,
        ChildSignal::Interrupt => Signal::SIGINT,
    };

    kill(Pid::from_raw(pid), sig)
        .map_err(|e| LaunchError::SignalFailed(format!("{} to pid {}: {}", sig, pid, e)))
}

#[cfg(unix)]
pub(crate) fn probe_alive(pid: i32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // Signal 0 checks existence without delivering anything
    kill(Pid::from_raw(pid), None).is_ok()
}

#[cfg(windows)]
pub(crate) fn deliver_signal(pid: i32, signal: ChildSignal) -> Result<(), LaunchError> {
    use std::process::Command;

    // Windows has no SIGTERM/SIGINT equivalent for arbitrary processes;
    // both termination requests force-kill via taskkill.
    match signal {
        ChildSignal::Terminate | ChildSignal::Kill => {
            let output = Command::new("taskkill")
                .args(["/F", "/PID", &pid.to_string()])
                .output()
                .map_err(|e| LaunchError::SignalFailed(e.to_string()))?;

            if !output.status.success() {
                return Err(LaunchError::SignalFailed(format!(
                    "taskkill failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                )));
            }
            Ok(())
        }
        ChildSignal::Interrupt => Err(LaunchError::SignalFailed(
            "interrupt delivery is not supported on this platform".to_string(),
        )),
    }
}

#[cfg(windows)]
pub(crate) fn probe_alive(pid: i32) -> bool {
    use std::process::Command;

    let output = Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output();

    if let Ok(output) = output {
        String::from_utf8_lossy(&output.stdout).contains(&pid.to_string())
    } else {
        false
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn own_pid_is_alive() {
        assert!(probe_alive(std::process::id() as i32));
    }

    #[test]
    fn signal_to_dead_pid_fails() {
        // Max pid on Linux is bounded well below this
        let err = deliver_signal(i32::MAX - 1, ChildSignal::Terminate).unwrap_err();
        assert!(matches!(err, LaunchError::SignalFailed(_)));
    }
}
