// sieve-core/src/infrastructure/adapters/duckdb.rs

use ::duckdb::{Config, Connection, params};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// Hexagonal imports
use crate::domain::anomaly::{Anomaly, AnomalyCategory, AnomalyStatus};
use crate::error::SieveError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::anomaly_store::AnomalyStore;

pub const ANOMALY_TABLE: &str = "data_quality_anomalies";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS data_quality_anomalies (
    table_name VARCHAR NOT NULL,
    record_id BIGINT NOT NULL,
    record_key VARCHAR,
    anomaly_type VARCHAR NOT NULL,
    anomaly_category VARCHAR NOT NULL,
    description VARCHAR NOT NULL,
    severity_score DOUBLE NOT NULL,
    detection_method VARCHAR NOT NULL,
    anomaly_data VARCHAR NOT NULL,
    batch_id VARCHAR NOT NULL,
    status VARCHAR NOT NULL,
    detected_at VARCHAR NOT NULL
)";

const INSERT: &str = "INSERT INTO data_quality_anomalies (
    table_name, record_id, record_key, anomaly_type, anomaly_category, description,
    severity_score, detection_method, anomaly_data, batch_id, status, detected_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const SELECT_BY_BATCH: &str = "SELECT
    table_name, record_id, record_key, anomaly_category, description,
    severity_score, anomaly_data, batch_id, status, detected_at
FROM data_quality_anomalies
WHERE batch_id = ?
ORDER BY record_id, anomaly_category";

/// Anomaly sink backed by a DuckDB file (or `:memory:`), one row per anomaly.
pub struct DuckDbAnomalyStore {
    conn: Arc<Mutex<Connection>>,
}

/// Raw row as read from DuckDB, converted outside the driver callback.
struct StoredRow {
    table_name: String,
    record_id: i64,
    record_key: Option<String>,
    anomaly_category: String,
    description: String,
    severity_score: f64,
    anomaly_data: String,
    batch_id: String,
    status: String,
    detected_at: String,
}

impl DuckDbAnomalyStore {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };
        conn.execute_batch(CREATE_TABLE)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SieveError> {
        self.conn
            .lock()
            .map_err(|_| InfrastructureError::Database(DatabaseError::Poisoned).into())
    }

    /// Every anomaly persisted for a batch, ordered by record position.
    pub async fn list_by_batch(&self, batch_id: &str) -> Result<Vec<Anomaly>, SieveError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(SELECT_BY_BATCH)?;
        let rows = stmt.query_map(params![batch_id], |row| {
            Ok(StoredRow {
                table_name: row.get(0)?,
                record_id: row.get(1)?,
                record_key: row.get(2)?,
                anomaly_category: row.get(3)?,
                description: row.get(4)?,
                severity_score: row.get(5)?,
                anomaly_data: row.get(6)?,
                batch_id: row.get(7)?,
                status: row.get(8)?,
                detected_at: row.get(9)?,
            })
        })?;

        let mut anomalies = Vec::new();
        for row in rows {
            anomalies.push(row?.into_anomaly()?);
        }
        Ok(anomalies)
    }

    pub async fn count(&self) -> Result<u64, SieveError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT count(*) FROM {}", ANOMALY_TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

impl StoredRow {
    fn into_anomaly(self) -> Result<Anomaly, SieveError> {
        let corrupted = |what: String| {
            SieveError::from(InfrastructureError::Database(DatabaseError::CorruptedRow(
                what,
            )))
        };

        let category: AnomalyCategory = self.anomaly_category.parse()?;
        let status: AnomalyStatus = self.status.parse()?;
        let record_id = usize::try_from(self.record_id)
            .map_err(|_| corrupted(format!("negative record_id {}", self.record_id)))?;
        let anomaly_data: Map<String, Value> =
            serde_json::from_str(&self.anomaly_data).map_err(InfrastructureError::from)?;
        let detected_at = DateTime::parse_from_rfc3339(&self.detected_at)
            .map_err(|e| corrupted(format!("detected_at '{}': {}", self.detected_at, e)))?
            .with_timezone(&Utc);

        Ok(Anomaly {
            table_name: self.table_name,
            record_id,
            record_key: self.record_key,
            anomaly_type: category.anomaly_type(),
            anomaly_category: category,
            description: self.description,
            severity_score: self.severity_score,
            detection_method: category.detection_method().to_string(),
            anomaly_data,
            batch_id: self.batch_id,
            status,
            detected_at,
        })
    }
}

#[async_trait]
impl AnomalyStore for DuckDbAnomalyStore {
    async fn store(&self, anomaly: &Anomaly) -> Result<(), SieveError> {
        let record_id = i64::try_from(anomaly.record_id).map_err(|_| {
            SieveError::InternalError(format!("record_id {} overflows BIGINT", anomaly.record_id))
        })?;
        let anomaly_data =
            serde_json::to_string(&anomaly.anomaly_data).map_err(InfrastructureError::from)?;

        let conn = self.lock()?;
        conn.execute(
            INSERT,
            params![
                anomaly.table_name,
                record_id,
                anomaly.record_key,
                anomaly.anomaly_type.as_str(),
                anomaly.anomaly_category.as_str(),
                anomaly.description,
                anomaly.severity_score,
                anomaly.detection_method,
                anomaly_data,
                anomaly.batch_id,
                anomaly.status.as_str(),
                anomaly.detected_at.to_rfc3339(),
            ],
        )?;
        debug!(
            table = %anomaly.table_name,
            record_id = anomaly.record_id,
            category = %anomaly.anomaly_category,
            "Anomaly persisted"
        );
        Ok(())
    }
}
