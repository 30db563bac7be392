//! Correspondence replayer.

use std::sync::Arc;

use feedback_database::{FeedbackStore, QuestionId};
use feedback_telegram::{ChatId, Keyboard, MessagingGateway};
use tracing::debug;

use crate::error::{BotError, BotResult};

#[derive(Clone)]
pub struct CorrespondenceReplayer {
    store: FeedbackStore,
    gateway: Arc<dyn MessagingGateway>,
}

impl CorrespondenceReplayer {
    pub fn new(store: FeedbackStore, gateway: Arc<dyn MessagingGateway>) -> Self {
        Self { store, gateway }
    }

    /// Forward every recorded message of the question to `to`, oldest first.
    ///
    /// Stops at the first failed delivery; messages already forwarded stay delivered.
    pub async fn replay(&self, question_id: QuestionId, to: ChatId) -> BotResult<usize> {
        let entries = self
            .store
            .correspondence()
            .list_by_question(question_id)
            .await?;

        for entry in &entries {
            let from = entry.sender_chat_id.ok_or_else(|| {
                BotError::not_found(format!("chat of the sender of message {}", entry.message_id))
            })?;
            self.gateway
                .forward_message(to, from, entry.message_id)
                .await?;
        }

        debug!(question_id, to, count = entries.len(), "correspondence replayed");
        Ok(entries.len())
    }

    /// Send the question header followed by its thread.
    ///
    /// Returns `None` without sending anything when the question does not exist.
    pub async fn show_question(
        &self,
        question_id: QuestionId,
        to: ChatId,
    ) -> BotResult<Option<usize>> {
        let Some(question) = self.store.questions().find_by_id(question_id).await? else {
            return Ok(None);
        };

        self.gateway
            .send_text(to, &question.header, Keyboard::None)
            .await?;
        self.replay(question.id, to).await.map(Some)
    }
}
