//! Correspondence entry definitions

use serde::{Deserialize, Serialize};

use crate::types::{ChatId, MessageId, QuestionId, UserId};

/// One message exchanged inside a question thread. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CorrespondenceEntry {
    pub id: i64,
    pub question_id: QuestionId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub is_employee: bool,
    pub created_at: String,
    /// Chat the original message lives in, needed to forward it again.
    pub sender_chat_id: Option<ChatId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCorrespondenceEntry {
    pub question_id: QuestionId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub is_employee: bool,
}
