//! Question entity definitions

use serde::{Deserialize, Serialize};

use crate::types::{ChatId, QuestionId, UserId};

/// A customer question together with the chat identities of both parties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: QuestionId,
    pub user_id: UserId,
    pub header: String,
    pub answerer_id: Option<UserId>,
    pub have_answer: bool,
    pub is_closed: bool,
    pub created_at: String,
    pub updated_at: String,
    pub asker_chat_id: Option<ChatId>,
    pub answerer_chat_id: Option<ChatId>,
}

impl Question {
    pub fn is_open(&self) -> bool {
        !self.is_closed
    }

    pub fn is_claimed(&self) -> bool {
        self.answerer_id.is_some()
    }

    pub fn is_claimed_by(&self, user_id: UserId) -> bool {
        self.answerer_id == Some(user_id)
    }

    /// Open, unclaimed and not yet answered: the only shape that can be claimed.
    pub fn is_claimable(&self) -> bool {
        self.is_open() && !self.is_claimed() && !self.have_answer
    }
}
