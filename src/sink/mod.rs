use async_trait::async_trait;

use crate::collector::MeasurementRecord;
use crate::error::PersistenceError;

pub mod sql;

pub use sql::SqlSink;

/// Куда пишутся принятые показания
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn insert(&self, record: &MeasurementRecord) -> Result<(), PersistenceError>;
}
