use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use feedback_config::load_from as load_config;
use feedback_runtime::{run_console, shutdown_signal, telemetry, BotServices};
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "feedback-server")]
#[command(about = "Customer feedback desk bot with an operator console")]
struct Cli {
    /// Configuration file; otherwise FEEDBACK_CONFIG and the default locations are searched
    #[arg(long, short)]
    config: Option<PathBuf>,
}

/// How long shutdown waits for the blocking stdin reader.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let result = runtime.block_on(run(cli));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting feedback bot");

    let explicit = cli
        .config
        .or_else(|| std::env::var_os("FEEDBACK_CONFIG").map(PathBuf::from));
    let config = load_config(explicit).context("failed to load configuration")?;

    let services = BotServices::initialise(&config)
        .await
        .context("failed to initialise bot services")?;
    services.announce().await?;

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let updates = services.updates.clone();
    let poller = tokio::spawn(async move {
        let stopped = async move {
            let _ = stop_rx.wait_for(|stop| *stop).await;
        };
        if let Err(err) = updates.run(stopped).await {
            error!(error = %err, "update loop failed");
        }
    });

    println!("Feedback bot console, type \"help\" for commands");
    let console = services.console.clone();
    let console_task = async move {
        let reader = BufReader::new(tokio::io::stdin());
        run_console(&console, reader, &mut std::io::stdout()).await
    };

    tokio::select! {
        result = console_task => result.context("console failed")?,
        _ = shutdown_signal() => {}
    }

    let _ = stop_tx.send(true);
    poller.await.context("update loop task panicked")?;

    info!("feedback bot shut down");
    Ok(())
}
