//! Participant repository for database operations.

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, info};

use crate::entities::{now_timestamp, ParticipantState, User};
use crate::types::{ChatId, DatabaseError, DatabaseResult, UserId};

const USER_COLUMNS: &str =
    "id, chat_id, nickname, state, is_employee, is_receiver, created_at, updated_at";

/// Repository for participant database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find participant by row id
    pub async fn find_by_id(&self, id: UserId) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_user).transpose().map_err(Into::into)
    }

    /// Find participant by chat identity
    pub async fn find_by_chat_id(&self, chat_id: ChatId) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE chat_id = ?"))
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_user).transpose().map_err(Into::into)
    }

    /// Find participant by display handle
    pub async fn find_by_nickname(&self, nickname: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE nickname = ? ORDER BY id ASC LIMIT 1"
        ))
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_user).transpose().map_err(Into::into)
    }

    /// Create or refresh a participant when they (re)start the conversation.
    ///
    /// An existing row is matched by chat identity first, then by handle so that
    /// employees registered by handle pick up their chat identity here. The
    /// employee flag is preserved; the receiver flag is reset.
    pub async fn upsert_on_start(
        &self,
        chat_id: ChatId,
        nickname: Option<&str>,
        state: ParticipantState,
    ) -> DatabaseResult<User> {
        let nickname = nickname.filter(|nick| !nick.is_empty());

        let existing = match self.find_by_chat_id(chat_id).await? {
            Some(user) => Some(user),
            None => match nickname {
                Some(nick) => self
                    .find_by_nickname(nick)
                    .await?
                    .filter(|user| user.chat_id.is_none()),
                None => None,
            },
        };

        let now = now_timestamp();

        let id = match existing {
            Some(user) => {
                sqlx::query(
                    "UPDATE users SET chat_id = ?, nickname = COALESCE(?, nickname), state = ?, is_receiver = FALSE, updated_at = ? WHERE id = ?",
                )
                .bind(chat_id)
                .bind(nickname)
                .bind(state.code())
                .bind(&now)
                .bind(user.id)
                .execute(&self.pool)
                .await?;
                debug!(user_id = user.id, chat_id, "refreshed participant on start");
                user.id
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO users (chat_id, nickname, state, is_employee, is_receiver, created_at, updated_at) VALUES (?, ?, ?, FALSE, FALSE, ?, ?)",
                )
                .bind(chat_id)
                .bind(nickname)
                .bind(state.code())
                .bind(&now)
                .bind(&now)
                .execute(&self.pool)
                .await?;
                let id = result.last_insert_rowid();
                info!(user_id = id, chat_id, "registered new participant");
                id
            }
        };

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("user {id}")))
    }

    /// Persist a new conversation state.
    pub async fn set_state(&self, id: UserId, state: ParticipantState) -> DatabaseResult<()> {
        let result = sqlx::query("UPDATE users SET state = ?, updated_at = ? WHERE id = ?")
            .bind(state.code())
            .bind(now_timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("user {id}")));
        }
        debug!(user_id = id, %state, "participant state changed");
        Ok(())
    }

    /// Toggle whether an employee is offered new questions.
    pub async fn set_receiver(&self, id: UserId, is_receiver: bool) -> DatabaseResult<()> {
        let result = sqlx::query("UPDATE users SET is_receiver = ?, updated_at = ? WHERE id = ?")
            .bind(is_receiver)
            .bind(now_timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("user {id}")));
        }
        info!(user_id = id, is_receiver, "employee receiver flag changed");
        Ok(())
    }

    /// Grant or revoke the employee role by chat identity, creating the row if needed.
    pub async fn set_employee_by_chat_id(
        &self,
        chat_id: ChatId,
        is_employee: bool,
    ) -> DatabaseResult<User> {
        let now = now_timestamp();
        sqlx::query(
            "INSERT INTO users (chat_id, state, is_employee, is_receiver, created_at, updated_at)
             VALUES (?, ?, ?, FALSE, ?, ?)
             ON CONFLICT(chat_id) DO UPDATE SET is_employee = excluded.is_employee, updated_at = excluded.updated_at",
        )
        .bind(chat_id)
        .bind(ParticipantState::New.code())
        .bind(is_employee)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        info!(chat_id, is_employee, "employee role updated by chat id");
        self.find_by_chat_id(chat_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("user with chat id {chat_id}")))
    }

    /// Grant or revoke the employee role by handle, creating the row if needed.
    pub async fn set_employee_by_nickname(
        &self,
        nickname: &str,
        is_employee: bool,
    ) -> DatabaseResult<User> {
        let nickname = nickname.trim_start_matches('@');
        if nickname.is_empty() {
            return Err(DatabaseError::validation("nickname must not be empty"));
        }

        let now = now_timestamp();
        let id = match self.find_by_nickname(nickname).await? {
            Some(user) => {
                sqlx::query("UPDATE users SET is_employee = ?, updated_at = ? WHERE id = ?")
                    .bind(is_employee)
                    .bind(&now)
                    .bind(user.id)
                    .execute(&self.pool)
                    .await?;
                user.id
            }
            None => sqlx::query(
                "INSERT INTO users (nickname, state, is_employee, is_receiver, created_at, updated_at) VALUES (?, ?, ?, FALSE, ?, ?)",
            )
            .bind(nickname)
            .bind(ParticipantState::New.code())
            .bind(is_employee)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await?
            .last_insert_rowid(),
        };

        info!(nickname, is_employee, "employee role updated by nickname");
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("user {id}")))
    }

    /// All participants flagged as employees.
    pub async fn list_employees(&self) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_employee = TRUE ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_user).collect::<Result<_, _>>().map_err(Into::into)
    }

    /// Employees that accept new questions and are not busy with an open claim.
    pub async fn list_receivers(&self) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users u
             WHERE u.is_employee = TRUE AND u.is_receiver = TRUE AND u.chat_id IS NOT NULL
               AND NOT EXISTS (
                   SELECT 1 FROM questions q WHERE q.answerer_id = u.id AND q.is_closed = FALSE
               )
             ORDER BY u.id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_user).collect::<Result<_, _>>().map_err(Into::into)
    }
}

fn map_user(row: &SqliteRow) -> Result<User, sqlx::Error> {
    let state: i64 = row.try_get("state")?;
    Ok(User {
        id: row.try_get("id")?,
        chat_id: row.try_get("chat_id")?,
        nickname: row.try_get("nickname")?,
        state: ParticipantState::from_code(state),
        is_employee: row.try_get("is_employee")?,
        is_receiver: row.try_get("is_receiver")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
