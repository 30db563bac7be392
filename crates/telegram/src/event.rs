//! Inbound updates reduced to what the dispatcher acts on.

use crate::types::{ChatId, MessageId, Update};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Message(IncomingMessage),
    ButtonPress(ButtonPress),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub update_id: i64,
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub nickname: Option<String>,
    /// Empty for messages without text.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPress {
    pub update_id: i64,
    pub chat_id: ChatId,
    pub data: String,
}

impl InboundEvent {
    /// Returns `None` for update kinds the bot does not handle.
    pub fn from_update(update: &Update) -> Option<Self> {
        if let Some(message) = &update.message {
            return Some(Self::Message(IncomingMessage {
                update_id: update.update_id,
                chat_id: message.chat.id,
                message_id: message.message_id,
                nickname: message
                    .from
                    .as_ref()
                    .and_then(|from| from.username.clone())
                    .filter(|nick| !nick.is_empty()),
                text: message.text.clone().unwrap_or_default(),
            }));
        }

        let callback = update.callback_query.as_ref()?;
        let chat_id = callback
            .message
            .as_ref()
            .map(|message| message.chat.id)
            .unwrap_or(callback.from.id);

        Some(Self::ButtonPress(ButtonPress {
            update_id: update.update_id,
            chat_id,
            data: callback.data.clone().unwrap_or_default(),
        }))
    }

    pub fn update_id(&self) -> i64 {
        match self {
            Self::Message(message) => message.update_id,
            Self::ButtonPress(press) => press.update_id,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::Message(message) => message.chat_id,
            Self::ButtonPress(press) => press.chat_id,
        }
    }
}
