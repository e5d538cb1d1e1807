// Launch Request Domain Model

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{LaunchError, Result};

/// Output policy for one of the child's stdout/stderr streams.
///
/// Descriptor inheritance is explicit opt-in: the default for every stream
/// is the null device, so nothing of the caller leaks into the child unless
/// the request says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamPolicy {
    /// Child writes into the caller's own stream
    Inherit,
    /// Child writes into a caller-owned byte buffer, delivered on wait
    Capture,
    /// Child writes into the platform null device
    Null,
}

/// Input policy for the child's stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StdinPolicy {
    /// Child reads the caller's own stdin
    Inherit,
    /// Child reads end-of-file immediately
    Null,
}

/// Everything needed to start one child process.
///
/// Constructed by the caller immediately before launch and discarded after
/// use; owns no resources. No request state survives a launch-and-wait call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Absolute path, or a bare name searched through the system PATH
    pub program: String,
    /// Full argument vector. argv[0] conventionally repeats the program
    /// name; that is a Unix convention, not an enforced equality.
    pub argv: Vec<String>,
    /// Overlayed on the inherited environment. None inherits unchanged.
    pub env_overrides: Option<HashMap<String, String>>,
    /// None inherits the caller's working directory
    pub current_dir: Option<PathBuf>,
    pub stdin: StdinPolicy,
    pub stdout: StreamPolicy,
    pub stderr: StreamPolicy,
}

impl LaunchRequest {
    /// New request for `program` with argv[0] preset to the program name
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            argv: vec![program.clone()],
            program,
            env_overrides: None,
            current_dir: None,
            stdin: StdinPolicy::Null,
            stdout: StreamPolicy::Null,
            stderr: StreamPolicy::Null,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    /// Override argv[0] without changing which program is executed
    pub fn argv0(mut self, name: impl Into<String>) -> Self {
        if self.argv.is_empty() {
            self.argv.push(name.into());
        } else {
            self.argv[0] = name.into();
        }
        self
    }

    /// Overlay one environment variable on the inherited environment
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Run the child in `dir` instead of the caller's working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn stdin(mut self, policy: StdinPolicy) -> Self {
        self.stdin = policy;
        self
    }

    pub fn stdout(mut self, policy: StreamPolicy) -> Self {
        self.stdout = policy;
        self
    }

    pub fn stderr(mut self, policy: StreamPolicy) -> Self {
        self.stderr = policy;
        self
    }

    /// Route both output streams into caller-owned buffers
    pub fn capture_output(mut self) -> Self {
        self.stdout = StreamPolicy::Capture;
        self.stderr = StreamPolicy::Capture;
        self
    }

    /// Opt all three stdio streams into inheritance
    pub fn inherit_stdio(mut self) -> Self {
        self.stdin = StdinPolicy::Inherit;
        self.stdout = StreamPolicy::Inherit;
        self.stderr = StreamPolicy::Inherit;
        self
    }

    /// Arguments after argv[0], in child order
    pub fn argv_tail(&self) -> &[String] {
        if self.argv.is_empty() {
            &[]
        } else {
            &self.argv[1..]
        }
    }

    /// Check structural invariants before any process is created
    pub fn validate(&self) -> Result<()> {
        if self.program.is_empty() {
            return Err(LaunchError::InvalidRequest("empty program name".to_string()));
        }
        if self.argv.is_empty() {
            return Err(LaunchError::InvalidRequest(
                "argument vector must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_presets_argv0() {
        let req = LaunchRequest::new("/bin/echo").arg("hello");
        assert_eq!(req.argv, vec!["/bin/echo", "hello"]);
        assert_eq!(req.argv_tail(), &["hello".to_string()]);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn defaults_leak_nothing() {
        let req = LaunchRequest::new("prog");
        assert_eq!(req.stdin, StdinPolicy::Null);
        assert_eq!(req.stdout, StreamPolicy::Null);
        assert_eq!(req.stderr, StreamPolicy::Null);
        assert!(req.env_overrides.is_none());
    }

    #[test]
    fn empty_argv_is_rejected() {
        let mut req = LaunchRequest::new("prog");
        req.argv.clear();
        assert!(matches!(req.validate(), Err(LaunchError::InvalidRequest(_))));
    }

    #[test]
    fn argv0_override_keeps_program() {
        let req = LaunchRequest::new("/bin/sh").argv0("sh").arg("-c").arg("exit 0");
        assert_eq!(req.program, "/bin/sh");
        assert_eq!(req.argv[0], "sh");
    }
}
