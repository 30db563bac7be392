//! HTTP client for the Bot API.

use std::time::Duration;

use async_trait::async_trait;
use feedback_config::TelegramConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::types::{BotCommand, ChatId, Keyboard, Message, MessageId, TelegramUser, Update};
use crate::MessagingGateway;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CopiedMessage {
    message_id: MessageId,
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> GatewayResult<Self> {
        let token = config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(GatewayError::MissingToken)?
            .to_string();

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn call<P, R>(&self, method: &str, payload: &P) -> GatewayResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let response = self.http.post(url).json(payload).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        let envelope: ApiResponse<R> = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(err) if status.is_success() => {
                return Err(GatewayError::InvalidResponse(format!("{method}: {err}")));
            }
            Err(_) => {
                return Err(GatewayError::Api {
                    method: method.to_string(),
                    code: Some(i64::from(status.as_u16())),
                    description: status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string(),
                });
            }
        };

        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| "unknown error".to_string());
            warn!(method, code = ?envelope.error_code, %description, "telegram api call rejected");
            return Err(GatewayError::Api {
                method: method.to_string(),
                code: envelope.error_code,
                description,
            });
        }

        envelope
            .result
            .ok_or_else(|| GatewayError::InvalidResponse(format!("{method}: missing result")))
    }
}

#[async_trait]
impl MessagingGateway for TelegramClient {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Keyboard,
    ) -> GatewayResult<MessageId> {
        let mut payload = json!({ "chat_id": chat_id, "text": text });
        if let Some(markup) = keyboard.to_markup() {
            payload["reply_markup"] = serde_json::to_value(markup)
                .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        }

        let message: Message = self.call("sendMessage", &payload).await?;
        debug!(chat_id, message_id = message.message_id, "text sent");
        Ok(message.message_id)
    }

    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId> {
        let payload = json!({ "chat_id": to, "from_chat_id": from, "message_id": message_id });
        let message: Message = self.call("forwardMessage", &payload).await?;
        debug!(to, from, message_id, "message forwarded");
        Ok(message.message_id)
    }

    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId> {
        let payload = json!({ "chat_id": to, "from_chat_id": from, "message_id": message_id });
        let copied: CopiedMessage = self.call("copyMessage", &payload).await?;
        debug!(to, from, message_id, "message copied");
        Ok(copied.message_id)
    }

    async fn get_updates(
        &self,
        offset: i64,
        timeout_seconds: u64,
        limit: u32,
    ) -> GatewayResult<Vec<Update>> {
        let payload = json!({
            "offset": offset,
            "timeout": timeout_seconds,
            "limit": limit,
            "allowed_updates": ["message", "callback_query"],
        });
        self.call("getUpdates", &payload).await
    }

    async fn set_commands(&self, commands: &[BotCommand]) -> GatewayResult<()> {
        let _: bool = self
            .call("setMyCommands", &json!({ "commands": commands }))
            .await?;
        Ok(())
    }

    async fn get_me(&self) -> GatewayResult<TelegramUser> {
        self.call("getMe", &json!({})).await
    }
}
