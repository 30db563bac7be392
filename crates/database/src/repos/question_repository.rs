//! Question repository for database operations.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::entities::{now_timestamp, Question};
use crate::types::{DatabaseError, DatabaseResult, QuestionId, UserId};

const QUESTION_SELECT: &str = "SELECT q.id, q.user_id, q.header, q.answerer_id, q.have_answer, q.is_closed,
        q.created_at, q.updated_at, asker.chat_id AS asker_chat_id, answerer.chat_id AS answerer_chat_id
     FROM questions q
     LEFT JOIN users asker ON asker.id = q.user_id
     LEFT JOIN users answerer ON answerer.id = q.answerer_id";

/// Repository for question database operations
#[derive(Clone)]
pub struct QuestionRepository {
    pool: SqlitePool,
}

impl QuestionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a question for the asker. No check for an already open question is made.
    pub async fn create(&self, user_id: UserId, header: &str) -> DatabaseResult<Question> {
        let now = now_timestamp();
        let id = sqlx::query(
            "INSERT INTO questions (user_id, header, answerer_id, have_answer, is_closed, created_at, updated_at)
             VALUES (?, ?, NULL, FALSE, FALSE, ?, ?)",
        )
        .bind(user_id)
        .bind(header)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(question_id = id, user_id, "question created");

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("question {id}")))
    }

    pub async fn find_by_id(&self, id: QuestionId) -> DatabaseResult<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!("{QUESTION_SELECT} WHERE q.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(question)
    }

    /// The asker's most recent open question.
    pub async fn find_open_by_asker(&self, user_id: UserId) -> DatabaseResult<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "{QUESTION_SELECT} WHERE q.user_id = ? AND q.is_closed = FALSE ORDER BY q.id DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    /// The open question currently claimed by the employee.
    pub async fn find_open_by_answerer(&self, user_id: UserId) -> DatabaseResult<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "{QUESTION_SELECT} WHERE q.answerer_id = ? AND q.is_closed = FALSE ORDER BY q.id DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    /// Open, unclaimed, unanswered questions, oldest first.
    pub async fn list_claimable(&self) -> DatabaseResult<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "{QUESTION_SELECT}
             WHERE q.answerer_id IS NULL AND q.have_answer = FALSE AND q.is_closed = FALSE
             ORDER BY q.id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    /// Compare-and-set claim. Returns `false` when someone else got there first
    /// or the question is no longer claimable.
    pub async fn try_claim(&self, id: QuestionId, answerer_id: UserId) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE questions SET answerer_id = ?, updated_at = ?
             WHERE id = ? AND answerer_id IS NULL AND have_answer = FALSE AND is_closed = FALSE",
        )
        .bind(answerer_id)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        let claimed = result.rows_affected() == 1;
        if claimed {
            info!(question_id = id, answerer_id, "question claimed");
        } else {
            debug!(question_id = id, answerer_id, "question claim lost");
        }
        Ok(claimed)
    }

    /// Drop the answerer without closing the question.
    pub async fn release(&self, id: QuestionId) -> DatabaseResult<()> {
        self.update_flag(
            "UPDATE questions SET answerer_id = NULL, updated_at = ? WHERE id = ?",
            None,
            id,
        )
        .await?;
        info!(question_id = id, "question released");
        Ok(())
    }

    pub async fn set_closed(&self, id: QuestionId, is_closed: bool) -> DatabaseResult<()> {
        self.update_flag(
            "UPDATE questions SET is_closed = ?, updated_at = ? WHERE id = ?",
            Some(is_closed),
            id,
        )
        .await?;
        info!(question_id = id, is_closed, "question closed flag changed");
        Ok(())
    }

    pub async fn set_have_answer(&self, id: QuestionId, have_answer: bool) -> DatabaseResult<()> {
        self.update_flag(
            "UPDATE questions SET have_answer = ?, updated_at = ? WHERE id = ?",
            Some(have_answer),
            id,
        )
        .await?;
        debug!(question_id = id, have_answer, "question answer flag changed");
        Ok(())
    }

    async fn update_flag(
        &self,
        sql: &str,
        flag: Option<bool>,
        id: QuestionId,
    ) -> DatabaseResult<()> {
        let mut query = sqlx::query(sql);
        if let Some(flag) = flag {
            query = query.bind(flag);
        }
        let result = query
            .bind(now_timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("question {id}")));
        }
        Ok(())
    }
}
