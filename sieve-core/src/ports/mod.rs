// sieve-core/src/ports/mod.rs

pub mod anomaly_store;

pub use anomaly_store::AnomalyStore;
