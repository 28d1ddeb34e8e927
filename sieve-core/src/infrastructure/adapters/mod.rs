// sieve-core/src/infrastructure/adapters/mod.rs

pub mod duckdb;
pub mod memory;

pub use self::duckdb::DuckDbAnomalyStore;
pub use memory::InMemoryAnomalyStore;
