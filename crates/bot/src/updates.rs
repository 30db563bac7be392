//! Update loop: long-polls the gateway and feeds events to the dispatcher.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use feedback_config::TelegramConfig;
use feedback_database::FeedbackStore;
use feedback_telegram::{InboundEvent, MessagingGateway, Update};
use tracing::{debug, error, info};

use crate::dispatcher::Dispatcher;
use crate::error::BotResult;

/// Next inbound update id to request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCursor(i64);

impl UpdateCursor {
    pub fn new(next_update_id: i64) -> Self {
        Self(next_update_id)
    }

    pub fn next_update_id(self) -> i64 {
        self.0
    }

    pub fn advance_past(&mut self, update_id: i64) {
        self.0 = self.0.max(update_id.saturating_add(1));
    }
}

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub timeout_seconds: u64,
    pub interval: Duration,
    pub batch_limit: u32,
}

impl From<&TelegramConfig> for PollSettings {
    fn from(config: &TelegramConfig) -> Self {
        Self {
            timeout_seconds: config.poll_timeout_seconds,
            interval: Duration::from_millis(config.poll_interval_ms),
            batch_limit: config.batch_limit,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub fetched: usize,
    pub handled: usize,
    pub failed: usize,
    pub cursor: UpdateCursor,
}

#[derive(Clone)]
pub struct UpdateLoop {
    store: FeedbackStore,
    gateway: Arc<dyn MessagingGateway>,
    dispatcher: Dispatcher,
    settings: PollSettings,
}

impl UpdateLoop {
    pub fn new(
        store: FeedbackStore,
        gateway: Arc<dyn MessagingGateway>,
        settings: PollSettings,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(store.clone(), gateway.clone()),
            store,
            gateway,
            settings,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn load_cursor(&self) -> BotResult<UpdateCursor> {
        Ok(UpdateCursor::new(self.store.cursor().load().await?))
    }

    async fn fetch(&self, cursor: UpdateCursor) -> BotResult<Vec<Update>> {
        Ok(self
            .gateway
            .get_updates(
                cursor.next_update_id(),
                self.settings.timeout_seconds,
                self.settings.batch_limit,
            )
            .await?)
    }

    /// Handle a fetched batch in order and persist the advanced cursor.
    ///
    /// A failing event is logged and skipped; the cursor still moves past it.
    pub async fn process(&self, mut cursor: UpdateCursor, updates: &[Update]) -> BatchSummary {
        let start = cursor;
        let mut summary = BatchSummary {
            fetched: updates.len(),
            ..BatchSummary::default()
        };

        for update in updates {
            cursor.advance_past(update.update_id);

            let Some(event) = InboundEvent::from_update(update) else {
                debug!(update_id = update.update_id, "skipping unsupported update");
                continue;
            };

            match self.dispatcher.handle(&event).await {
                Ok(()) => summary.handled += 1,
                Err(error) => {
                    summary.failed += 1;
                    error!(
                        update_id = update.update_id,
                        chat_id = event.chat_id(),
                        %error,
                        "failed to handle update"
                    );
                }
            }
        }

        if cursor != start {
            if let Err(error) = self.store.cursor().save(cursor.next_update_id()).await {
                error!(next_update_id = cursor.next_update_id(), %error, "failed to persist update cursor");
            }
        }

        summary.cursor = cursor;
        summary
    }

    /// Fetch and process one batch.
    pub async fn run_once(&self, cursor: UpdateCursor) -> BotResult<BatchSummary> {
        let updates = self.fetch(cursor).await?;
        Ok(self.process(cursor, &updates).await)
    }

    /// Poll until `shutdown` resolves. A batch already fetched is processed to the end.
    pub async fn run<F>(&self, shutdown: F) -> BotResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut cursor = self.load_cursor().await?;
        info!(next_update_id = cursor.next_update_id(), "update loop started");
        tokio::pin!(shutdown);

        loop {
            let fetched = tokio::select! {
                _ = &mut shutdown => break,
                fetched = self.fetch(cursor) => fetched,
            };

            match fetched {
                Ok(updates) => {
                    let summary = self.process(cursor, &updates).await;
                    if summary.fetched > 0 {
                        debug!(
                            fetched = summary.fetched,
                            handled = summary.handled,
                            failed = summary.failed,
                            "update batch processed"
                        );
                    }
                    cursor = summary.cursor;
                }
                Err(error) => error!(%error, "failed to fetch updates"),
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        info!(next_update_id = cursor.next_update_id(), "update loop stopped");
        Ok(())
    }
}
