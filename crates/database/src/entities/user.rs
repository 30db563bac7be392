//! Participant entity definitions

use serde::{Deserialize, Serialize};

use crate::types::{ChatId, UserId};

/// A customer or employee known to the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Absent for employees registered by handle who have not written yet.
    pub chat_id: Option<ChatId>,
    pub nickname: Option<String>,
    pub state: ParticipantState,
    pub is_employee: bool,
    pub is_receiver: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn is_customer(&self) -> bool {
        !self.is_employee
    }

    /// Whether this participant should be offered freshly created questions.
    pub fn accepts_questions(&self) -> bool {
        self.is_employee && self.is_receiver
    }
}

/// Conversation state persisted per participant.
///
/// The numeric codes are the stored representation and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantState {
    New,
    Main,
    Review,
    ReviewText,
    Question,
    QuestionDiscussion,
    SwitchReceiver,
    SearchQuestion,
}

impl ParticipantState {
    pub const ALL: [ParticipantState; 8] = [
        ParticipantState::New,
        ParticipantState::Main,
        ParticipantState::Review,
        ParticipantState::ReviewText,
        ParticipantState::Question,
        ParticipantState::QuestionDiscussion,
        ParticipantState::SwitchReceiver,
        ParticipantState::SearchQuestion,
    ];

    pub fn code(self) -> i64 {
        match self {
            ParticipantState::New => 1,
            ParticipantState::Main => 2,
            ParticipantState::Review => 3,
            ParticipantState::ReviewText => 4,
            ParticipantState::Question => 5,
            ParticipantState::QuestionDiscussion => 6,
            ParticipantState::SwitchReceiver => 7,
            ParticipantState::SearchQuestion => 8,
        }
    }

    /// Unknown codes fall back to `New`, which the dispatcher promotes to `Main`.
    pub fn from_code(code: i64) -> Self {
        Self::ALL
            .into_iter()
            .find(|state| state.code() == code)
            .unwrap_or(ParticipantState::New)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantState::New => "new",
            ParticipantState::Main => "main",
            ParticipantState::Review => "review",
            ParticipantState::ReviewText => "review_text",
            ParticipantState::Question => "question",
            ParticipantState::QuestionDiscussion => "question_discussion",
            ParticipantState::SwitchReceiver => "switch_receiver",
            ParticipantState::SearchQuestion => "search_question",
        }
    }

    /// States that only make sense for employees.
    pub fn is_employee_only(self) -> bool {
        matches!(
            self,
            ParticipantState::SwitchReceiver | ParticipantState::SearchQuestion
        )
    }
}

impl std::fmt::Display for ParticipantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
