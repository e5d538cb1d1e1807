//! Minimal end-to-end launch: wires logging, then runs `echo` under both
//! creation strategies and prints the reaped results.
//!
//! ```text
//! RUST_LOG=forklift=debug cargo run -p forklift-infra-process --example launch
//! ```

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use forklift_core::config::LauncherConfig;
use forklift_core::domain::{LaunchRequest, SpawnStrategy};
use forklift_infra_process::build_service;

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("forklift=info"))
        .expect("Failed to create env filter");
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty())
        .init();

    let base = LauncherConfig::from_env();

    for strategy in [SpawnStrategy::ForkExec, SpawnStrategy::DirectSpawn] {
        let service = build_service(LauncherConfig {
            strategy,
            ..base.clone()
        });

        let request = LaunchRequest::new("echo")
            .arg("hello from")
            .arg(strategy.to_string())
            .capture_output();

        let result = service.run(&request).await?;
        println!(
            "{}: pid {} {} -> {:?}",
            strategy,
            result.pid,
            result.status,
            result.stdout_lossy().trim_end()
        );
    }

    Ok(())
}
