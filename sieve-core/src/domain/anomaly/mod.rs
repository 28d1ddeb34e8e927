// sieve-core/src/domain/anomaly/mod.rs

pub mod model;
pub mod record;

pub use model::{Anomaly, AnomalyCategory, AnomalyStatus, AnomalyType};
pub use record::Record;
