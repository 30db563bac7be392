#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use feedback_bot::{BotResult, Dispatcher};
use feedback_config::DatabaseConfig;
use feedback_database::{initialize_database, FeedbackStore, User};
use feedback_telegram::{
    BotCommand, ButtonPress, ChatId, GatewayError, GatewayResult, InboundEvent, IncomingMessage,
    Keyboard, MessageId, MessagingGateway, TelegramUser, Update,
};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat_id: ChatId,
        text: String,
        keyboard: Keyboard,
    },
    Forward {
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    },
    Copy {
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    },
}

impl Sent {
    pub fn recipient(&self) -> ChatId {
        match self {
            Self::Text { chat_id, .. } => *chat_id,
            Self::Forward { to, .. } | Self::Copy { to, .. } => *to,
        }
    }
}

/// In-memory gateway that records every delivery.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<HashSet<ChatId>>,
    budgets: Mutex<HashMap<ChatId, usize>>,
    batches: Mutex<VecDeque<Vec<Update>>>,
    offsets: Mutex<Vec<i64>>,
    next_message_id: AtomicI64,
}

impl RecordingGateway {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|sent| sent.recipient() == chat_id)
            .collect()
    }

    pub fn texts_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sent_to(chat_id)
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_text_to(&self, chat_id: ChatId) -> Option<(String, Keyboard)> {
        self.sent_to(chat_id)
            .into_iter()
            .rev()
            .find_map(|sent| match sent {
                Sent::Text { text, keyboard, .. } => Some((text, keyboard)),
                _ => None,
            })
    }

    /// Every delivery to `chat_id` fails until [`RecordingGateway::recover`].
    pub fn fail_for(&self, chat_id: ChatId) {
        self.failing.lock().unwrap().insert(chat_id);
    }

    pub fn recover(&self, chat_id: ChatId) {
        self.failing.lock().unwrap().remove(&chat_id);
        self.budgets.lock().unwrap().remove(&chat_id);
    }

    /// The next `deliveries` to `chat_id` succeed, every later one fails.
    pub fn fail_after(&self, chat_id: ChatId, deliveries: usize) {
        self.budgets.lock().unwrap().insert(chat_id, deliveries);
    }

    pub fn queue_updates(&self, updates: Vec<Update>) {
        self.batches.lock().unwrap().push_back(updates);
    }

    pub fn requested_offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }

    fn deliver(&self, method: &str, to: ChatId, sent: Sent) -> GatewayResult<MessageId> {
        if let Some(remaining) = self.budgets.lock().unwrap().get_mut(&to) {
            if *remaining == 0 {
                self.failing.lock().unwrap().insert(to);
            } else {
                *remaining -= 1;
            }
        }
        if self.failing.lock().unwrap().contains(&to) {
            return Err(GatewayError::Api {
                method: method.to_string(),
                code: Some(403),
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        self.sent.lock().unwrap().push(sent);
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst) + 10_000)
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Keyboard,
    ) -> GatewayResult<MessageId> {
        self.deliver(
            "sendMessage",
            chat_id,
            Sent::Text {
                chat_id,
                text: text.to_string(),
                keyboard,
            },
        )
    }

    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId> {
        self.deliver("forwardMessage", to, Sent::Forward { to, from, message_id })
    }

    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId> {
        self.deliver("copyMessage", to, Sent::Copy { to, from, message_id })
    }

    async fn get_updates(
        &self,
        offset: i64,
        _timeout_seconds: u64,
        _limit: u32,
    ) -> GatewayResult<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn set_commands(&self, _commands: &[BotCommand]) -> GatewayResult<()> {
        Ok(())
    }

    async fn get_me(&self) -> GatewayResult<TelegramUser> {
        Ok(TelegramUser {
            id: 1,
            is_bot: true,
            first_name: "Feedback".to_string(),
            username: Some("feedback_bot".to_string()),
        })
    }
}

pub async fn test_store() -> (FeedbackStore, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("bot.db").to_string_lossy()),
        max_connections: 4,
    };
    let pool = initialize_database(&config)
        .await
        .expect("database should initialise");
    (FeedbackStore::new(pool), dir)
}

/// Dispatcher wired to a recording gateway and a fresh database.
pub struct Harness {
    pub store: FeedbackStore,
    pub gateway: Arc<RecordingGateway>,
    pub dispatcher: Dispatcher,
    next_message_id: AtomicI64,
    next_update_id: AtomicI64,
    _dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        let (store, dir) = test_store().await;
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = Dispatcher::new(store.clone(), gateway.clone());
        Self {
            store,
            gateway,
            dispatcher,
            next_message_id: AtomicI64::new(1),
            next_update_id: AtomicI64::new(1),
            _dir: dir,
        }
    }

    /// Deliver a text message and return its message id once handled.
    pub async fn text(&self, chat_id: ChatId, text: &str) -> BotResult<MessageId> {
        self.text_from(chat_id, None, text).await
    }

    pub async fn text_from(
        &self,
        chat_id: ChatId,
        nickname: Option<&str>,
        text: &str,
    ) -> BotResult<MessageId> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        let event = InboundEvent::Message(IncomingMessage {
            update_id: self.next_update_id.fetch_add(1, Ordering::SeqCst),
            chat_id,
            message_id,
            nickname: nickname.map(str::to_string),
            text: text.to_string(),
        });
        self.dispatcher.handle(&event).await?;
        Ok(message_id)
    }

    pub async fn press(&self, chat_id: ChatId, data: &str) -> BotResult<()> {
        let update_id = self.next_update_id.fetch_add(1, Ordering::SeqCst);
        let event = InboundEvent::ButtonPress(ButtonPress {
            update_id,
            chat_id,
            data: data.to_string(),
        });
        self.dispatcher.handle(&event).await
    }

    pub async fn user(&self, chat_id: ChatId) -> User {
        self.store
            .users()
            .find_by_chat_id(chat_id)
            .await
            .expect("user lookup")
            .expect("user should exist")
    }

    pub async fn customer(&self, chat_id: ChatId) -> User {
        self.text(chat_id, "/start").await.expect("customer start");
        self.user(chat_id).await
    }

    /// Register an employee, start them and optionally switch receiving on.
    pub async fn employee(&self, chat_id: ChatId, receiving: bool) -> User {
        self.store
            .users()
            .set_employee_by_chat_id(chat_id, true)
            .await
            .expect("grant employee role");
        self.text(chat_id, "/start").await.expect("employee start");
        if receiving {
            self.text(chat_id, "❓Receive questions")
                .await
                .expect("switch receiving on");
        }
        self.user(chat_id).await
    }

    /// Customer asks a question from the main menu; returns the question id.
    pub async fn ask(&self, chat_id: ChatId, header: &str) -> i64 {
        self.text(chat_id, "❓Question").await.expect("question button");
        self.text(chat_id, header).await.expect("question header");
        let user = self.user(chat_id).await;
        self.store
            .questions()
            .find_open_by_asker(user.id)
            .await
            .expect("question lookup")
            .expect("question should be open")
            .id
    }
}
