//! Repository for question thread messages.

use sqlx::SqlitePool;
use tracing::debug;

use crate::entities::{now_timestamp, CorrespondenceEntry, NewCorrespondenceEntry};
use crate::types::{DatabaseResult, QuestionId};

#[derive(Clone)]
pub struct CorrespondenceRepository {
    pool: SqlitePool,
}

impl CorrespondenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one message to a question thread.
    pub async fn append(&self, entry: NewCorrespondenceEntry) -> DatabaseResult<i64> {
        let id = sqlx::query(
            "INSERT INTO question_correspondence (question_id, message_id, user_id, is_employee, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry.question_id)
        .bind(entry.message_id)
        .bind(entry.user_id)
        .bind(entry.is_employee)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(
            question_id = entry.question_id,
            message_id = entry.message_id,
            is_employee = entry.is_employee,
            "correspondence appended"
        );
        Ok(id)
    }

    /// Thread of a question in the order the messages were recorded.
    pub async fn list_by_question(
        &self,
        question_id: QuestionId,
    ) -> DatabaseResult<Vec<CorrespondenceEntry>> {
        let entries = sqlx::query_as::<_, CorrespondenceEntry>(
            "SELECT c.id, c.question_id, c.message_id, c.user_id, c.is_employee, c.created_at,
                    u.chat_id AS sender_chat_id
             FROM question_correspondence c
             LEFT JOIN users u ON u.id = c.user_id
             WHERE c.question_id = ?
             ORDER BY c.id ASC",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
