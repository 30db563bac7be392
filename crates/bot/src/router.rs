//! Question router: fan-out of new questions and claim handling.

use std::sync::Arc;

use feedback_database::{FeedbackStore, Question, QuestionId, User};
use feedback_telegram::{ChatId, Keyboard, MessagingGateway};
use tracing::{info, warn};

use crate::buttons;
use crate::error::{BotError, BotResult};

/// Result of an employee pressing "Take question".
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed(Question),
    /// The employee already answers this question.
    AlreadyYours(Question),
    /// Claimed by someone else, answered, closed or unknown.
    Taken,
}

pub fn offer_text(question: &Question) -> String {
    format!("Question #{}\n{}", question.id, question.header)
}

#[derive(Clone)]
pub struct QuestionRouter {
    store: FeedbackStore,
    gateway: Arc<dyn MessagingGateway>,
}

impl QuestionRouter {
    pub fn new(store: FeedbackStore, gateway: Arc<dyn MessagingGateway>) -> Self {
        Self { store, gateway }
    }

    /// Send a claim offer for `question` to `chat_id`.
    pub async fn offer(&self, chat_id: ChatId, question: &Question) -> BotResult<()> {
        self.gateway
            .send_text(
                chat_id,
                &offer_text(question),
                Keyboard::inline(buttons::TAKE_QUESTION, buttons::claim_payload(question.id)),
            )
            .await?;
        Ok(())
    }

    /// Offer a new question to every receiving employee without an open claim.
    ///
    /// A failed delivery is logged and does not stop the fan-out. Returns the
    /// number of employees reached.
    pub async fn assign_question_to_employees(&self, question: &Question) -> BotResult<usize> {
        let receivers = self.store.users().list_receivers().await?;
        let mut delivered = 0;

        for receiver in &receivers {
            let Some(chat_id) = receiver.chat_id else {
                continue;
            };
            match self.offer(chat_id, question).await {
                Ok(()) => delivered += 1,
                Err(error) => warn!(
                    question_id = question.id,
                    chat_id,
                    %error,
                    "failed to offer question to employee"
                ),
            }
        }

        info!(
            question_id = question.id,
            receivers = receivers.len(),
            delivered,
            "question fanned out"
        );
        Ok(delivered)
    }

    /// Open, unclaimed, unanswered questions in id order.
    pub async fn open_questions(&self) -> BotResult<Vec<Question>> {
        Ok(self.store.questions().list_claimable().await?)
    }

    /// Claim a question for `employee`. The first claim wins.
    ///
    /// An employee answers one question at a time: a claim held on another
    /// open question is released once the new claim has succeeded. A lost
    /// claim leaves the previous one in place.
    pub async fn claim_question(
        &self,
        employee: &User,
        question_id: QuestionId,
    ) -> BotResult<ClaimOutcome> {
        let questions = self.store.questions();

        let previous = questions.find_open_by_answerer(employee.id).await?;
        if let Some(current) = &previous {
            if current.id == question_id {
                return Ok(ClaimOutcome::AlreadyYours(current.clone()));
            }
        }

        if !questions.try_claim(question_id, employee.id).await? {
            return Ok(ClaimOutcome::Taken);
        }

        if let Some(current) = previous {
            info!(
                question_id = current.id,
                answerer_id = employee.id,
                "releasing previous claim after taking a new question"
            );
            questions.release(current.id).await?;
        }

        let question = questions
            .find_by_id(question_id)
            .await?
            .ok_or_else(|| BotError::not_found(format!("question {question_id}")))?;
        Ok(ClaimOutcome::Claimed(question))
    }
}
