use async_trait::async_trait;
use sqlx::{AnyConnection, Connection};

use super::RecordSink;
use crate::collector::MeasurementRecord;
use crate::config::settings::DatabaseSettings;
use crate::error::PersistenceError;

/// Формат ObservedAt, точность до секунды
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Запись в SQL базу; соединение открывается на каждую вставку
pub struct SqlSink {
    url: String,
    statement: String,
}

impl SqlSink {
    pub fn new(settings: &DatabaseSettings) -> Self {
        sqlx::any::install_default_drivers();

        Self {
            url: settings.url.clone(),
            statement: insert_statement(&settings.table, &settings.url),
        }
    }

    async fn write(
        &self,
        conn: &mut AnyConnection,
        record: &MeasurementRecord,
    ) -> Result<(), PersistenceError> {
        let mut tx = conn.begin().await.map_err(PersistenceError::Write)?;

        sqlx::query(&self.statement)
            .bind(record.device_name.clone())
            .bind(record.device_address.clone())
            .bind(i64::from(record.left))
            .bind(i64::from(record.right))
            .bind(record.observed_at.format(TIMESTAMP_FORMAT).to_string())
            .execute(&mut *tx)
            .await
            .map_err(PersistenceError::Write)?;

        tx.commit().await.map_err(PersistenceError::Write)
    }
}

#[async_trait]
impl RecordSink for SqlSink {
    async fn insert(&self, record: &MeasurementRecord) -> Result<(), PersistenceError> {
        let mut conn = AnyConnection::connect(&self.url)
            .await
            .map_err(PersistenceError::Connect)?;

        let result = self.write(&mut conn, record).await;

        if let Err(e) = conn.close().await {
            tracing::warn!("Соединение с базой закрылось с ошибкой: {}", e);
        }

        result
    }
}

/// Postgres понимает только $N, MySQL и SQLite берут `?`.
/// ObservedAt привязан строкой, поэтому Postgres и MySQL приводят его к
/// timestamp явно; SQLite хранит время текстом, там CAST превратил бы его в число.
fn insert_statement(table: &str, url: &str) -> String {
    let values = if url.starts_with("postgres") {
        "$1, $2, $3, $4, CAST($5 AS TIMESTAMP)"
    } else if url.starts_with("mysql") || url.starts_with("mariadb") {
        "?, ?, ?, ?, CAST(? AS DATETIME)"
    } else {
        "?, ?, ?, ?, ?"
    };

    format!(
        "INSERT INTO {} (Store, SourceAddress, CountLeft, CountRight, ObservedAt) VALUES ({})",
        table, values
    )
}
