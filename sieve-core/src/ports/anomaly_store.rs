// sieve-core/src/ports/anomaly_store.rs

// What the engine needs from the anomaly sink, without knowing how it persists.

use crate::domain::anomaly::Anomaly;
use crate::error::SieveError;
use async_trait::async_trait;

#[async_trait]
pub trait AnomalyStore: Send + Sync {
    /// Durably appends one anomaly. Failures propagate to the caller.
    async fn store(&self, anomaly: &Anomaly) -> Result<(), SieveError>;
}
