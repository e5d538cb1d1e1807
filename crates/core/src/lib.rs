// Forklift Core - Domain Logic & Ports
// NO platform dependencies: process adapters live in forklift-infra-process

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use config::LauncherConfig;
pub use error::{LaunchError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
