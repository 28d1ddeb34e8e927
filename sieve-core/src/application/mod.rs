// sieve-core/src/application/mod.rs

pub mod orchestrator;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Lets the CLI do `use sieve_core::application::DetectionOrchestrator;`
pub use orchestrator::DetectionOrchestrator;
