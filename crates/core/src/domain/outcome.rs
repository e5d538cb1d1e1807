// Launch Outcome Domain Model

use serde::{Deserialize, Serialize};

/// How a reaped child ended.
///
/// A signal death is a reported outcome, never a launcher failure: the
/// launcher's contract is creation and monitoring, not the child's success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminationStatus {
    /// Normal exit with code 0-255
    Exited(i32),
    /// Terminated by the given signal number
    Signaled(i32),
}

impl TerminationStatus {
    pub fn success(&self) -> bool {
        matches!(self, TerminationStatus::Exited(0))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            TerminationStatus::Exited(code) => Some(*code),
            TerminationStatus::Signaled(_) => None,
        }
    }

    pub fn signal(&self) -> Option<i32> {
        match self {
            TerminationStatus::Exited(_) => None,
            TerminationStatus::Signaled(sig) => Some(*sig),
        }
    }
}

impl std::fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationStatus::Exited(code) => write!(f, "exited with code {}", code),
            TerminationStatus::Signaled(sig) => write!(f, "terminated by signal {}", sig),
        }
    }
}

/// Result of one launch-and-wait.
///
/// Produced exactly once, when the child terminates and is reaped;
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchResult {
    /// OS process identifier the child ran under
    pub pid: i32,
    pub status: TerminationStatus,
    /// Wall time from creation to reaping, in milliseconds
    pub duration_ms: i64,
    /// Captured stdout bytes; Some only when the request asked for capture.
    /// Lossless and in child write order.
    pub stdout: Option<Vec<u8>>,
    /// Captured stderr bytes; Some only when the request asked for capture
    pub stderr: Option<Vec<u8>>,
}

impl LaunchResult {
    /// Captured stdout as text, for logs and assertions
    pub fn stdout_lossy(&self) -> String {
        self.stdout
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// Captured stderr as text, for logs and assertions
    pub fn stderr_lossy(&self) -> String {
        self.stderr
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accessors() {
        let exited = TerminationStatus::Exited(7);
        assert_eq!(exited.exit_code(), Some(7));
        assert_eq!(exited.signal(), None);
        assert!(!exited.success());
        assert!(TerminationStatus::Exited(0).success());

        let signaled = TerminationStatus::Signaled(15);
        assert_eq!(signaled.exit_code(), None);
        assert_eq!(signaled.signal(), Some(15));
        assert_eq!(signaled.to_string(), "terminated by signal 15");
    }
}
