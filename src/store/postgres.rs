// src/store/postgres.rs
use async_trait::async_trait;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;

use crate::database::DbPool;
use crate::error::StoreError;
use crate::models::{CallRecord, Direction};
use crate::store::CallStore;

/// Postgres-backed store over the shared connection pool. The `calls`
/// table carries a unique index on `call_id`; SQLSTATE 23505 on insert
/// is translated to `StoreError::DuplicateKey` so the recorder can fold
/// a lost lookup/insert race into a duplicate outcome.
pub struct PostgresCallStore {
    db_pool: DbPool,
}

impl PostgresCallStore {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }

    fn row_to_record(row: &Row) -> Result<CallRecord, StoreError> {
        let direction_str: String = row
            .try_get("direction")
            .map_err(|e| StoreError::Transient(e.to_string()))?;
        let direction = match direction_str.as_str() {
            "incoming" => Direction::Incoming,
            _ => Direction::Outgoing,
        };

        Ok(CallRecord {
            call_id: row
                .try_get("call_id")
                .map_err(|e| StoreError::Transient(e.to_string()))?,
            direction,
            from_number: row
                .try_get("from_number")
                .map_err(|e| StoreError::Transient(e.to_string()))?,
            to_number: row
                .try_get("to_number")
                .map_err(|e| StoreError::Transient(e.to_string()))?,
            start_time: row
                .try_get("start_time")
                .map_err(|e| StoreError::Transient(e.to_string()))?,
            answered_time: row
                .try_get("answered_time")
                .map_err(|e| StoreError::Transient(e.to_string()))?,
            end_time: row
                .try_get("end_time")
                .map_err(|e| StoreError::Transient(e.to_string()))?,
            duration_sec: row
                .try_get("duration_sec")
                .map_err(|e| StoreError::Transient(e.to_string()))?,
            area_code: row
                .try_get("area_code")
                .map_err(|e| StoreError::Transient(e.to_string()))?,
            cost: row
                .try_get("cost")
                .map_err(|e| StoreError::Transient(e.to_string()))?,
            day: row
                .try_get("day")
                .map_err(|e| StoreError::Transient(e.to_string()))?,
            ingested_at: row
                .try_get("ingested_at")
                .map_err(|e| StoreError::Transient(e.to_string()))?,
        })
    }

    fn map_insert_error(e: tokio_postgres::Error, call_id: &str) -> StoreError {
        if let Some(db_err) = e.as_db_error() {
            if db_err.code() == &SqlState::UNIQUE_VIOLATION {
                return StoreError::DuplicateKey(call_id.to_string());
            }
        }
        StoreError::Transient(e.to_string())
    }
}

#[async_trait]
impl CallStore for PostgresCallStore {
    async fn find_by_call_id(&self, call_id: &str) -> Result<Option<CallRecord>, StoreError> {
        let client = self
            .db_pool
            .get()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let row = client
            .query_opt(
                "SELECT call_id, direction, from_number, to_number, start_time,
                        answered_time, end_time, duration_sec, area_code, cost,
                        day, ingested_at
                 FROM calls
                 WHERE call_id = $1",
                &[&call_id],
            )
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn insert(&self, record: CallRecord) -> Result<(), StoreError> {
        let client = self
            .db_pool
            .get()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        client
            .execute(
                "INSERT INTO calls
                 (call_id, direction, from_number, to_number, start_time,
                  answered_time, end_time, duration_sec, area_code, cost,
                  day, ingested_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
                &[
                    &record.call_id,
                    &record.direction.as_str(),
                    &record.from_number,
                    &record.to_number,
                    &record.start_time,
                    &record.answered_time,
                    &record.end_time,
                    &record.duration_sec,
                    &record.area_code,
                    &record.cost,
                    &record.day,
                    &record.ingested_at,
                ],
            )
            .await
            .map_err(|e| Self::map_insert_error(e, &record.call_id))?;

        Ok(())
    }
}
