// sieve-core/src/lib.rs

// 1. Docs are not mandatory yet
#![allow(missing_docs)]
// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts the engine needs from the outside world (anomaly sink).
pub mod ports;

// 2. Domain (business core)
// Anomaly model, field registry, detection strategies.
// Depends on NOTHING else (neither infra nor app).
pub mod domain;

// 3. Infrastructure (Adapters)
// DuckDB store, in-memory store, YAML config loading, atomic file writes.
pub mod infrastructure;

// 4. Application (Use Cases)
// Detection orchestrator.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use application::DetectionOrchestrator;
pub use domain::anomaly::{Anomaly, AnomalyCategory, AnomalyStatus, AnomalyType, Record};
pub use error::SieveError;
