//! Persisted position of the inbound update stream.

use sqlx::SqlitePool;
use tracing::debug;

use crate::entities::now_timestamp;
use crate::types::DatabaseResult;

#[derive(Clone)]
pub struct CursorRepository {
    pool: SqlitePool,
}

impl CursorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Next update id to request; zero when nothing has been processed yet.
    pub async fn load(&self) -> DatabaseResult<i64> {
        let cursor: Option<(i64,)> =
            sqlx::query_as("SELECT next_update_id FROM update_cursor WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(cursor.map(|(next,)| next).unwrap_or(0))
    }

    pub async fn save(&self, next_update_id: i64) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO update_cursor (id, next_update_id, updated_at) VALUES (1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET next_update_id = excluded.next_update_id, updated_at = excluded.updated_at",
        )
        .bind(next_update_id)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        debug!(next_update_id, "update cursor saved");
        Ok(())
    }
}
