// Port Layer - Interfaces for platform dependencies

pub mod id_provider; // For deterministic testing
pub mod launcher;
pub mod memory_probe;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use launcher::{ChildSignal, LaunchedChild, ProcessLauncher};
pub use memory_probe::MemoryProbe;
pub use time_provider::TimeProvider;
