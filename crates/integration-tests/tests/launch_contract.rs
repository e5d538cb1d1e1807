//! Launch Contract Tests
//!
//! The two creation strategies must be observably identical: every property
//! here is asserted under FORK_EXEC and DIRECT_SPAWN alike, against real
//! child processes.

#![cfg(unix)]

use forklift_core::application::LaunchService;
use forklift_core::config::LauncherConfig;
use forklift_core::domain::{LaunchRequest, SpawnStrategy, TerminationStatus};
use forklift_core::error::LaunchError;
use forklift_infra_process::build_service;

const BOTH_STRATEGIES: [SpawnStrategy; 2] =
    [SpawnStrategy::ForkExec, SpawnStrategy::DirectSpawn];

fn service(strategy: SpawnStrategy) -> LaunchService {
    build_service(LauncherConfig {
        strategy,
        ..LauncherConfig::default()
    })
}

fn sh(script: &str) -> LaunchRequest {
    LaunchRequest::new("/bin/sh").arg("-c").arg(script)
}

#[tokio::test]
async fn exit_code_matches_the_declared_code() {
    for strategy in BOTH_STRATEGIES {
        let result = service(strategy).run(&sh("exit 7")).await.unwrap();

        assert_eq!(
            result.status,
            TerminationStatus::Exited(7),
            "strategy {} must report the child's own exit code",
            strategy
        );
        assert!(result.pid > 0);
    }
}

#[tokio::test]
async fn nonexistent_program_fails_without_a_lingering_process() {
    for strategy in BOTH_STRATEGIES {
        let svc = service(strategy);
        let request = LaunchRequest::new("/no/such/program-anywhere");

        let err = svc.run(&request).await.unwrap_err();

        assert!(
            matches!(err, LaunchError::ExecutableNotFound(_)),
            "strategy {} must classify a missing target",
            strategy
        );
    }
}

#[tokio::test]
async fn argv_tail_arrives_exactly_in_order() {
    for strategy in BOTH_STRATEGIES {
        // The operand after the script becomes $0; $@ is everything after it
        let request = sh("printf '%s\\n' \"$@\"")
            .arg("sh")
            .arg("first")
            .arg("second with space")
            .arg("third")
            .capture_output();

        let result = service(strategy).run(&request).await.unwrap();

        assert_eq!(
            result.stdout_lossy(),
            "first\nsecond with space\nthird\n",
            "strategy {} must pass the argv tail unchanged",
            strategy
        );
    }
}

#[tokio::test]
async fn captured_stdout_is_lossless_and_ordered() {
    for strategy in BOTH_STRATEGIES {
        // Interleaved writes, including a NUL byte: capture is bytes
        let request = sh("printf 'one'; printf '\\000'; printf 'two'").capture_output();

        let result = service(strategy).run(&request).await.unwrap();

        assert_eq!(result.stdout.as_deref(), Some(&b"one\0two"[..]));
    }
}

#[tokio::test]
async fn stderr_capture_is_separate_from_stdout() {
    for strategy in BOTH_STRATEGIES {
        let request = sh("echo out; echo err >&2").capture_output();

        let result = service(strategy).run(&request).await.unwrap();

        assert_eq!(result.stdout_lossy(), "out\n");
        assert_eq!(result.stderr_lossy(), "err\n");
    }
}

#[tokio::test]
async fn sequential_launches_share_no_state() {
    for strategy in BOTH_STRATEGIES {
        let svc = service(strategy);
        let request = sh("exit 3");

        let first = svc.run(&request).await.unwrap();
        let second = svc.run(&request).await.unwrap();

        assert_eq!(first.status, TerminationStatus::Exited(3));
        assert_eq!(second.status, TerminationStatus::Exited(3));
        assert_ne!(first.pid, second.pid, "each launch is its own process");
    }
}

#[tokio::test]
async fn signal_death_is_an_outcome_not_an_error() {
    for strategy in BOTH_STRATEGIES {
        let result = service(strategy)
            .run(&sh("kill -TERM $$"))
            .await
            .unwrap();

        assert_eq!(result.status, TerminationStatus::Signaled(15));
        assert_eq!(result.status.exit_code(), None);
    }
}

#[tokio::test]
async fn environment_overrides_overlay_the_inherited_environment() {
    for strategy in BOTH_STRATEGIES {
        let request = sh("printf '%s:%s' \"$FORKLIFT_CONTRACT_VAR\" \"${HOME:+have-home}\"")
            .env("FORKLIFT_CONTRACT_VAR", "set-by-test")
            .capture_output();

        let result = service(strategy).run(&request).await.unwrap();

        assert_eq!(
            result.stdout_lossy(),
            "set-by-test:have-home",
            "strategy {}: override visible and inherited vars intact",
            strategy
        );
    }
}

#[tokio::test]
async fn working_directory_is_applied_before_the_child_runs() {
    for strategy in BOTH_STRATEGIES {
        let request = sh("pwd").current_dir("/").capture_output();

        let result = service(strategy).run(&request).await.unwrap();

        assert_eq!(result.stdout_lossy().trim_end(), "/");
    }
}

#[tokio::test]
async fn empty_argv_is_rejected_before_creation() {
    for strategy in BOTH_STRATEGIES {
        let mut request = LaunchRequest::new("/bin/sh");
        request.argv.clear();

        let err = service(strategy).run(&request).await.unwrap_err();

        assert!(matches!(err, LaunchError::InvalidRequest(_)));
    }
}
