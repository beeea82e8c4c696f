use async_trait::async_trait;
use chrono::SecondsFormat;
use sinkhole_application::ports::{ClientHistory, QueryLogRepository};
use sinkhole_domain::{DomainError, RequestLogEntry};
use sqlx::{Row, SqlitePool};
use std::net::IpAddr;
use tracing::{debug, instrument};

/// Rows per INSERT statement; keeps bound parameters under SQLite's limit.
const ROWS_PER_STATEMENT: usize = 500;

const INSERT_PREFIX: &str = "INSERT INTO request_log (domain, record_type, protocol, status, resolved, blocked, cached, response_size, elapsed_us, client_ip, client_hostname, client_mac, client_vendor, created_at) VALUES ";
const ROW_PLACEHOLDER: &str = "(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

pub struct SqliteQueryLogRepository {
    pool: SqlitePool,
}

impl SqliteQueryLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, DomainError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM request_log")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        Ok(row.get("total"))
    }
}

#[async_trait]
impl QueryLogRepository for SqliteQueryLogRepository {
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn save_batch(&self, entries: &[RequestLogEntry]) -> Result<(), DomainError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        for chunk in entries.chunks(ROWS_PER_STATEMENT) {
            let mut sql = String::from(INSERT_PREFIX);
            for i in 0..chunk.len() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(ROW_PLACEHOLDER);
            }

            let mut query = sqlx::query(&sql);
            for entry in chunk {
                let resolved = (!entry.resolved.is_empty()).then(|| entry.resolved.join(","));
                query = query
                    .bind(&*entry.domain)
                    .bind(entry.query_type.as_str())
                    .bind(entry.protocol.as_str())
                    .bind(entry.status)
                    .bind(resolved)
                    .bind(entry.blocked)
                    .bind(entry.cached)
                    .bind(entry.response_size as i64)
                    .bind(entry.elapsed_us() as i64)
                    .bind(entry.client.ip.to_string())
                    .bind(entry.client.hostname.as_deref())
                    .bind(entry.client.mac.as_deref())
                    .bind(entry.client.vendor.as_deref())
                    .bind(entry.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true));
            }

            query
                .execute(&mut *tx)
                .await
                .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        debug!(count = entries.len(), "Request log batch saved");
        Ok(())
    }
}

#[async_trait]
impl ClientHistory for SqliteQueryLogRepository {
    async fn hostname_for_ip(&self, ip: IpAddr) -> Result<Option<String>, DomainError> {
        let row = sqlx::query(
            "SELECT client_hostname FROM request_log
             WHERE client_ip = ? AND client_hostname IS NOT NULL
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(ip.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        Ok(row.map(|r| r.get::<String, _>("client_hostname")))
    }
}
