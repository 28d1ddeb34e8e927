// sieve-core/src/infrastructure/adapters/memory.rs

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::anomaly::Anomaly;
use crate::error::SieveError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::anomaly_store::AnomalyStore;

/// Volatile anomaly sink for dry runs and tests.
#[derive(Clone, Default)]
pub struct InMemoryAnomalyStore {
    anomalies: Arc<Mutex<Vec<Anomaly>>>,
}

impl InMemoryAnomalyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Result<Vec<Anomaly>, SieveError> {
        let guard = self
            .anomalies
            .lock()
            .map_err(|_| InfrastructureError::Database(DatabaseError::Poisoned))?;
        Ok(guard.clone())
    }

    pub fn len(&self) -> usize {
        self.anomalies.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AnomalyStore for InMemoryAnomalyStore {
    async fn store(&self, anomaly: &Anomaly) -> Result<(), SieveError> {
        self.anomalies
            .lock()
            .map_err(|_| InfrastructureError::Database(DatabaseError::Poisoned))?
            .push(anomaly.clone());
        Ok(())
    }
}
