// Central Error Type for the Launcher

use thiserror::Error;

/// Launcher error taxonomy
///
/// A child that terminates via signal is NOT an error here: the launcher's
/// job is to create and monitor, not to guarantee the child's own success.
/// Signal deaths are reported as `TerminationStatus::Signaled` inside a
/// successful `LaunchResult`.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// Request rejected before any process was created
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Target program missing or not executable. Not retryable.
    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),

    /// The platform could not allocate a new process (process-table or
    /// memory limits). Retryable with backoff.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The wait primitive itself errored. The caller decides whether to
    /// retry the wait or treat the child as abandoned.
    #[error("Wait failed: {0}")]
    WaitFailed(String),

    /// Explicit signal delivery failed
    #[error("Signal delivery failed: {0}")]
    SignalFailed(String),

    /// Redirection or pipe plumbing failure that fits none of the above
    #[error("IO error: {0}")]
    Io(String),
}

impl LaunchError {
    /// Classify a process-creation failure reported by the platform.
    ///
    /// ENOENT/EACCES mean the target cannot be located or executed;
    /// EAGAIN/ENOMEM mean the platform ran out of room for a new process.
    pub fn from_spawn_error(program: &str, err: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                LaunchError::ExecutableNotFound(program.to_string())
            }
            ErrorKind::WouldBlock | ErrorKind::OutOfMemory => {
                LaunchError::ResourceExhausted(err.to_string())
            }
            _ => LaunchError::Io(err.to_string()),
        }
    }
}

/// Result type alias using LaunchError
pub type Result<T> = std::result::Result<T, LaunchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn not_found_maps_to_executable_not_found() {
        let err = Error::new(ErrorKind::NotFound, "No such file or directory");
        assert!(matches!(
            LaunchError::from_spawn_error("/no/such/bin", &err),
            LaunchError::ExecutableNotFound(p) if p == "/no/such/bin"
        ));
    }

    #[test]
    fn permission_denied_maps_to_executable_not_found() {
        let err = Error::new(ErrorKind::PermissionDenied, "Permission denied");
        assert!(matches!(
            LaunchError::from_spawn_error("./script.py", &err),
            LaunchError::ExecutableNotFound(_)
        ));
    }

    #[test]
    fn allocation_failures_map_to_resource_exhausted() {
        for kind in [ErrorKind::WouldBlock, ErrorKind::OutOfMemory] {
            let err = Error::new(kind, "Resource temporarily unavailable");
            assert!(matches!(
                LaunchError::from_spawn_error("prog", &err),
                LaunchError::ResourceExhausted(_)
            ));
        }
    }

    #[test]
    fn other_errors_map_to_io() {
        let err = Error::new(ErrorKind::BrokenPipe, "Broken pipe");
        assert!(matches!(
            LaunchError::from_spawn_error("prog", &err),
            LaunchError::Io(_)
        ));
    }
}
