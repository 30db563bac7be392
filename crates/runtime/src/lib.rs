use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use feedback_bot::{OperatorConsole, PollSettings, UpdateLoop};
use feedback_config::AppConfig;
use feedback_database::{initialize_database, FeedbackStore};
use feedback_telegram::{BotCommand, MessagingGateway, TelegramClient, TelegramUser};
use sqlx::SqlitePool;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info};

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::DEBUG)
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Commands advertised in the client's command menu.
pub fn bot_commands() -> Vec<BotCommand> {
    vec![BotCommand::new("start", "Starts chatting with the bot")]
}

#[derive(Clone)]
pub struct BotServices {
    pub db_pool: SqlitePool,
    pub store: FeedbackStore,
    pub gateway: Arc<dyn MessagingGateway>,
    pub updates: UpdateLoop,
    pub console: OperatorConsole,
}

impl BotServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let client =
            TelegramClient::new(&config.telegram).context("failed to create telegram client")?;

        Ok(Self::with_gateway(config, db_pool, Arc::new(client)))
    }

    /// Wire the services around an already built gateway.
    pub fn with_gateway(
        config: &AppConfig,
        db_pool: SqlitePool,
        gateway: Arc<dyn MessagingGateway>,
    ) -> Self {
        let store = FeedbackStore::new(db_pool.clone());
        let updates = UpdateLoop::new(
            store.clone(),
            gateway.clone(),
            PollSettings::from(&config.telegram),
        );

        Self {
            db_pool,
            console: OperatorConsole::new(store.clone()),
            store,
            gateway,
            updates,
        }
    }

    /// Check the token against the transport and register the command menu.
    pub async fn announce(&self) -> Result<TelegramUser> {
        let me = self
            .gateway
            .get_me()
            .await
            .context("failed to verify telegram bot token")?;

        self.gateway
            .set_commands(&bot_commands())
            .await
            .context("failed to register bot commands")?;

        info!(bot_id = me.id, username = ?me.username, "telegram bot ready");
        Ok(me)
    }
}

/// Read operator commands line by line until `close` or end of input.
pub async fn run_console<R, W>(console: &OperatorConsole, reader: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match console.execute_line(&line).await {
            Ok(reply) => {
                for text in &reply.lines {
                    writeln!(out, "{text}")?;
                }
                if reply.close {
                    info!("console requested shutdown");
                    break;
                }
            }
            Err(err) => {
                error!(error = %err, command = %line.trim(), "console command failed");
                writeln!(out, "Command failed: {err}")?;
            }
        }
    }

    Ok(())
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
