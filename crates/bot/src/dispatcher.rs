//! Update dispatcher: applies one inbound event at a time.

use std::sync::Arc;

use chrono::Utc;
use feedback_database::{
    FeedbackStore, NewCorrespondenceEntry, ParticipantState, QuestionId, User, NO_COMMENT,
};
use feedback_telegram::{
    ButtonPress, ChatId, InboundEvent, IncomingMessage, Keyboard, MessagingGateway,
};
use tracing::{debug, info, warn};

use crate::buttons;
use crate::error::{BotError, BotResult};
use crate::machine::{transition, EventClass, Role, Transition};
use crate::prompts;
use crate::replay::CorrespondenceReplayer;
use crate::reviews::{ReportInterval, ReviewReporter};
use crate::router::{ClaimOutcome, QuestionRouter};

pub const NO_QUESTIONS: &str = "No questions";
pub const QUESTION_TAKEN: &str = "Question already taken";
pub const ALREADY_ANSWERING: &str = "You are already answering this question";
pub const WRONG_FORMAT: &str = "Wrong format";
pub const QUESTION_NOT_FOUND: &str = "Question not found";

/// The participant an event is being applied to.
struct Turn<'a> {
    chat_id: ChatId,
    user: User,
    message: Option<&'a IncomingMessage>,
}

impl<'a> Turn<'a> {
    fn message(&self) -> BotResult<&'a IncomingMessage> {
        self.message
            .ok_or_else(|| BotError::not_found("message for a text transition"))
    }

    fn role(&self) -> Role {
        Role::of(&self.user)
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    store: FeedbackStore,
    gateway: Arc<dyn MessagingGateway>,
    router: QuestionRouter,
    replayer: CorrespondenceReplayer,
    reporter: ReviewReporter,
}

impl Dispatcher {
    pub fn new(store: FeedbackStore, gateway: Arc<dyn MessagingGateway>) -> Self {
        Self {
            router: QuestionRouter::new(store.clone(), gateway.clone()),
            replayer: CorrespondenceReplayer::new(store.clone(), gateway.clone()),
            reporter: ReviewReporter::new(store.clone(), gateway.clone()),
            store,
            gateway,
        }
    }

    pub fn router(&self) -> &QuestionRouter {
        &self.router
    }

    pub fn replayer(&self) -> &CorrespondenceReplayer {
        &self.replayer
    }

    /// Apply one inbound event. Errors abort the current transition only.
    pub async fn handle(&self, event: &InboundEvent) -> BotResult<()> {
        match event {
            InboundEvent::Message(message) => self.handle_message(message).await,
            InboundEvent::ButtonPress(press) => self.handle_button(press).await,
        }
    }

    async fn handle_message(&self, message: &IncomingMessage) -> BotResult<()> {
        let class = EventClass::from_text(&message.text);
        if class == EventClass::Start {
            return self.start(message).await;
        }

        let user = self.participant(message.chat_id).await?;
        self.apply(
            Turn {
                chat_id: message.chat_id,
                user,
                message: Some(message),
            },
            class,
        )
        .await
    }

    async fn handle_button(&self, press: &ButtonPress) -> BotResult<()> {
        let class = EventClass::from_callback(&press.data);
        let user = self.participant(press.chat_id).await?;
        self.apply(
            Turn {
                chat_id: press.chat_id,
                user,
                message: None,
            },
            class,
        )
        .await
    }

    async fn participant(&self, chat_id: ChatId) -> BotResult<User> {
        self.store
            .users()
            .find_by_chat_id(chat_id)
            .await?
            .ok_or_else(|| BotError::not_found(format!("participant with chat id {chat_id}")))
    }

    async fn apply(&self, mut turn: Turn<'_>, class: EventClass) -> BotResult<()> {
        let state = turn.user.state;
        let Some(step) = transition(turn.role(), state, class) else {
            debug!(chat_id = turn.chat_id, %state, ?class, "event ignored");
            return Ok(());
        };
        debug!(chat_id = turn.chat_id, %state, ?step, "applying transition");

        match step {
            Transition::Start => self.start(turn.message()?).await,
            Transition::Activate(next) => self.set_state(&mut turn, next).await,
            Transition::Enter(next) => self.enter(&mut turn, next).await,
            Transition::RecordRating(rating) => self.record_rating(&mut turn, rating).await,
            Transition::RecordComment => self.record_comment(&mut turn).await,
            Transition::CreateQuestion => self.create_question(&mut turn).await,
            Transition::CloseQuestion => self.close_question(&mut turn).await,
            Transition::CustomerReply => self.customer_reply(&turn).await,
            Transition::ToggleReceiver => self.toggle_receiver(&mut turn).await,
            Transition::ListOpenQuestions => self.list_open_questions(&turn).await,
            Transition::SendReport(interval) => self.send_report(&turn, interval).await,
            Transition::ReleaseQuestion => self.release_question(&mut turn).await,
            Transition::EmployeeReply => self.employee_reply(&turn).await,
            Transition::SearchQuestion => self.search_question(&turn).await,
            Transition::Claim(question_id) => self.claim(&mut turn, question_id).await,
        }
    }

    /// Register or refresh the participant, close their open question and greet them.
    async fn start(&self, message: &IncomingMessage) -> BotResult<()> {
        let users = self.store.users();
        let user = users
            .upsert_on_start(
                message.chat_id,
                message.nickname.as_deref(),
                ParticipantState::New,
            )
            .await?;

        let questions = self.store.questions();
        if let Some(question) = questions.find_open_by_asker(user.id).await? {
            questions.set_closed(question.id, true).await?;
            info!(question_id = question.id, "open question closed by restart");
        }

        let greeting = prompts::greeting(Role::of(&user));
        self.gateway
            .send_text(message.chat_id, &greeting.text, greeting.keyboard)
            .await?;
        users.set_state(user.id, ParticipantState::Main).await?;

        info!(
            chat_id = message.chat_id,
            user_id = user.id,
            is_employee = user.is_employee,
            "participant started"
        );
        Ok(())
    }

    async fn set_state(&self, turn: &mut Turn<'_>, next: ParticipantState) -> BotResult<()> {
        self.store.users().set_state(turn.user.id, next).await?;
        turn.user.state = next;
        Ok(())
    }

    /// Move to `next` and show its prompt.
    async fn enter(&self, turn: &mut Turn<'_>, next: ParticipantState) -> BotResult<()> {
        let previous = turn.user.state;
        self.set_state(turn, next).await?;
        self.prompt_or_rollback(turn, previous).await
    }

    /// Send the prompt of the current state; on failure restore `previous`.
    async fn prompt_or_rollback(
        &self,
        turn: &mut Turn<'_>,
        previous: ParticipantState,
    ) -> BotResult<()> {
        let Err(error) = self.send_prompt(turn).await else {
            return Ok(());
        };

        warn!(
            chat_id = turn.chat_id,
            state = %turn.user.state,
            %previous,
            %error,
            "prompt delivery failed, restoring previous state"
        );
        self.set_state(turn, previous).await?;
        Err(error)
    }

    async fn send_prompt(&self, turn: &Turn<'_>) -> BotResult<()> {
        let open_question = if turn.role() == Role::Customer
            && turn.user.state == ParticipantState::QuestionDiscussion
        {
            self.store
                .questions()
                .find_open_by_asker(turn.user.id)
                .await?
        } else {
            None
        };

        if let Some(prompt) = prompts::resolve(&turn.user, open_question.as_ref()) {
            self.gateway
                .send_text(turn.chat_id, &prompt.text, prompt.keyboard)
                .await?;
        }
        Ok(())
    }

    async fn reply(&self, chat_id: ChatId, text: &str) -> BotResult<()> {
        self.gateway.send_text(chat_id, text, Keyboard::None).await?;
        Ok(())
    }

    async fn record_rating(&self, turn: &mut Turn<'_>, rating: u8) -> BotResult<()> {
        self.store.reviews().create(turn.user.id, rating).await?;
        self.enter(turn, ParticipantState::ReviewText).await
    }

    async fn record_comment(&self, turn: &mut Turn<'_>) -> BotResult<()> {
        let message = turn.message()?;
        let comment = if message.text == buttons::CLOSE {
            NO_COMMENT
        } else {
            message.text.as_str()
        };

        if self
            .store
            .reviews()
            .complete_pending(turn.user.id, comment)
            .await?
            .is_none()
        {
            debug!(chat_id = turn.chat_id, "no review was waiting for a comment");
        }
        self.enter(turn, ParticipantState::Main).await
    }

    async fn create_question(&self, turn: &mut Turn<'_>) -> BotResult<()> {
        let header = turn.message()?.text.clone();
        let question = self.store.questions().create(turn.user.id, &header).await?;
        self.router.assign_question_to_employees(&question).await?;
        self.enter(turn, ParticipantState::QuestionDiscussion).await
    }

    async fn close_question(&self, turn: &mut Turn<'_>) -> BotResult<()> {
        let message = turn.message()?;
        let message_id = message.message_id;
        let previous = turn.user.state;
        self.set_state(turn, ParticipantState::Main).await?;

        let questions = self.store.questions();
        if let Some(question) = questions.find_open_by_asker(turn.user.id).await? {
            self.store
                .correspondence()
                .append(NewCorrespondenceEntry {
                    question_id: question.id,
                    message_id,
                    user_id: turn.user.id,
                    is_employee: false,
                })
                .await?;
            questions.set_closed(question.id, true).await?;
            info!(question_id = question.id, "question closed by customer");

            if let Some(answerer_chat) = question.answerer_chat_id {
                self.gateway
                    .forward_message(answerer_chat, turn.chat_id, message_id)
                    .await?;
            }
        }

        self.prompt_or_rollback(turn, previous).await
    }

    async fn customer_reply(&self, turn: &Turn<'_>) -> BotResult<()> {
        let message = turn.message()?;
        let questions = self.store.questions();
        let Some(question) = questions.find_open_by_asker(turn.user.id).await? else {
            debug!(chat_id = turn.chat_id, "no open question for customer message");
            return Ok(());
        };

        if let Some(answerer_chat) = question.answerer_chat_id {
            self.gateway
                .forward_message(answerer_chat, turn.chat_id, message.message_id)
                .await?;
        }
        questions.set_have_answer(question.id, false).await?;
        self.store
            .correspondence()
            .append(NewCorrespondenceEntry {
                question_id: question.id,
                message_id: message.message_id,
                user_id: turn.user.id,
                is_employee: false,
            })
            .await?;
        Ok(())
    }

    async fn employee_reply(&self, turn: &Turn<'_>) -> BotResult<()> {
        let message = turn.message()?;
        let questions = self.store.questions();
        let Some(question) = questions.find_open_by_answerer(turn.user.id).await? else {
            debug!(chat_id = turn.chat_id, "employee holds no open question");
            return Ok(());
        };

        let asker_chat = question.asker_chat_id.ok_or_else(|| {
            BotError::not_found(format!("chat of the asker of question {}", question.id))
        })?;
        self.gateway
            .copy_message(asker_chat, turn.chat_id, message.message_id)
            .await?;
        questions.set_have_answer(question.id, true).await?;
        self.store
            .correspondence()
            .append(NewCorrespondenceEntry {
                question_id: question.id,
                message_id: message.message_id,
                user_id: turn.user.id,
                is_employee: true,
            })
            .await?;
        Ok(())
    }

    /// Flip the receive flag through the transient `SwitchReceiver` state.
    async fn toggle_receiver(&self, turn: &mut Turn<'_>) -> BotResult<()> {
        let users = self.store.users();
        self.set_state(turn, ParticipantState::SwitchReceiver).await?;

        let is_receiver = !turn.user.is_receiver;
        users.set_receiver(turn.user.id, is_receiver).await?;
        turn.user.is_receiver = is_receiver;
        self.set_state(turn, ParticipantState::Main).await?;

        let confirmation = prompts::receiver_switched(is_receiver);
        if let Err(error) = self
            .gateway
            .send_text(turn.chat_id, &confirmation.text, confirmation.keyboard)
            .await
        {
            warn!(chat_id = turn.chat_id, %error, "confirmation failed, restoring receiver flag");
            users.set_receiver(turn.user.id, !is_receiver).await?;
            turn.user.is_receiver = !is_receiver;
            return Err(error.into());
        }
        Ok(())
    }

    async fn list_open_questions(&self, turn: &Turn<'_>) -> BotResult<()> {
        let questions = self.router.open_questions().await?;
        if questions.is_empty() {
            return self.reply(turn.chat_id, NO_QUESTIONS).await;
        }

        for question in &questions {
            self.router.offer(turn.chat_id, question).await?;
        }
        Ok(())
    }

    async fn send_report(&self, turn: &Turn<'_>, interval: ReportInterval) -> BotResult<()> {
        self.reporter
            .send_report(turn.chat_id, interval, Utc::now())
            .await?;
        Ok(())
    }

    async fn release_question(&self, turn: &mut Turn<'_>) -> BotResult<()> {
        let previous = turn.user.state;
        self.set_state(turn, ParticipantState::Main).await?;

        let questions = self.store.questions();
        if let Some(question) = questions.find_open_by_answerer(turn.user.id).await? {
            questions.release(question.id).await?;
        }

        self.prompt_or_rollback(turn, previous).await
    }

    async fn search_question(&self, turn: &Turn<'_>) -> BotResult<()> {
        let question_id = match parse_question_id(&turn.message()?.text) {
            Ok(id) => id,
            Err(BotError::Parse(input)) => {
                debug!(chat_id = turn.chat_id, %input, "question number not understood");
                return self.reply(turn.chat_id, WRONG_FORMAT).await;
            }
            Err(error) => return Err(error),
        };

        match self.replayer.show_question(question_id, turn.chat_id).await? {
            Some(_) => Ok(()),
            None => self.reply(turn.chat_id, QUESTION_NOT_FOUND).await,
        }
    }

    async fn claim(&self, turn: &mut Turn<'_>, question_id: QuestionId) -> BotResult<()> {
        match self.router.claim_question(&turn.user, question_id).await? {
            ClaimOutcome::Taken => self.reply(turn.chat_id, QUESTION_TAKEN).await,
            ClaimOutcome::AlreadyYours(_) => {
                self.reply(turn.chat_id, ALREADY_ANSWERING).await?;
                self.enter(turn, ParticipantState::QuestionDiscussion).await
            }
            ClaimOutcome::Claimed(question) => {
                self.replayer.replay(question.id, turn.chat_id).await?;
                self.enter(turn, ParticipantState::QuestionDiscussion).await
            }
        }
    }
}

fn parse_question_id(text: &str) -> BotResult<QuestionId> {
    text.trim()
        .parse::<QuestionId>()
        .map_err(|_| BotError::Parse(format!("question number {text:?}")))
}
