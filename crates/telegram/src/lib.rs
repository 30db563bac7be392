//! Messaging gateway for the feedback desk bot.
//!
//! The [`MessagingGateway`] trait is what the bot core talks to;
//! [`TelegramClient`] implements it over the Bot API HTTP interface.

use async_trait::async_trait;

pub mod client;
pub mod error;
pub mod event;
pub mod types;

pub use client::TelegramClient;
pub use error::{GatewayError, GatewayResult};
pub use event::{ButtonPress, InboundEvent, IncomingMessage};
pub use types::{
    BotCommand, CallbackQuery, Chat, ChatId, Keyboard, Message, MessageId, TelegramUser, Update,
};

/// Outbound delivery and inbound polling.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a text message, returning the id of the delivered message.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Keyboard,
    ) -> GatewayResult<MessageId>;

    /// Forward a message keeping its origin visible.
    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId>;

    /// Copy a message without the origin header.
    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId>;

    /// Long-poll for updates with id `>= offset`.
    async fn get_updates(
        &self,
        offset: i64,
        timeout_seconds: u64,
        limit: u32,
    ) -> GatewayResult<Vec<Update>>;

    async fn set_commands(&self, commands: &[BotCommand]) -> GatewayResult<()>;

    async fn get_me(&self) -> GatewayResult<TelegramUser>;
}
