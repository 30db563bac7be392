//! Bot API wire types, limited to the fields the bot reads.

use serde::{Deserialize, Serialize};

/// Stable chat identity assigned by the transport.
pub type ChatId = i64;

/// Transport-assigned id of a message inside one chat.
pub type MessageId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

impl BotCommand {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// Keyboard attached to an outgoing text message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Keyboard {
    #[default]
    None,
    /// Reply keyboard with one button per row, resized to fit.
    Reply(Vec<String>),
    /// Inline keyboard holding a single callback button.
    Inline { text: String, data: String },
}

impl Keyboard {
    pub fn reply<I, S>(buttons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Reply(buttons.into_iter().map(Into::into).collect())
    }

    pub fn inline(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Inline {
            text: text.into(),
            data: data.into(),
        }
    }

    /// Labels shown to the participant, in display order.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Self::None => Vec::new(),
            Self::Reply(buttons) => buttons.iter().map(String::as_str).collect(),
            Self::Inline { text, .. } => vec![text.as_str()],
        }
    }

    pub(crate) fn to_markup(&self) -> Option<ReplyMarkup> {
        match self {
            Self::None => None,
            Self::Reply(buttons) => Some(ReplyMarkup::Reply {
                keyboard: buttons
                    .iter()
                    .map(|text| vec![KeyboardButton { text: text.clone() }])
                    .collect(),
                resize_keyboard: true,
            }),
            Self::Inline { text, data } => Some(ReplyMarkup::Inline {
                inline_keyboard: vec![vec![InlineKeyboardButton {
                    text: text.clone(),
                    callback_data: data.clone(),
                }]],
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum ReplyMarkup {
    Reply {
        keyboard: Vec<Vec<KeyboardButton>>,
        resize_keyboard: bool,
    },
    Inline {
        inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    },
}

#[derive(Debug, Serialize)]
pub(crate) struct KeyboardButton {
    text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct InlineKeyboardButton {
    text: String,
    callback_data: String,
}
