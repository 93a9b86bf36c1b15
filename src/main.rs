// Keeper assistant entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config
// 3. Open the player store
// 4. Build the chat-model client
// 5. Create the sync command channel
// 6. Spawn the sync worker task
// 7. Run the HTTP server until ctrl-c

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::info;

use keeper_assistant::config;
use keeper_assistant::db;
use keeper_assistant::llm::client::OpenAiClient;
use keeper_assistant::server;
use keeper_assistant::sync;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Keeper assistant starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: port={}, model={}, db={}",
        config.port, config.llm.model, config.db_path
    );

    // 3. Open the player store
    let store = Arc::new(db::PlayerStore::open(&config.db_path).context("failed to open database")?);
    info!(
        "Player store opened at {} ({} players)",
        config.db_path,
        store.player_count().unwrap_or(0)
    );

    // 4. Build the chat-model client
    let model = OpenAiClient::from_config(&config);
    if model.is_configured() {
        info!("Chat model client initialized (API key configured)");
    } else {
        info!("Chat model client has no API key; AI endpoints will fail until one is configured");
    }

    // 5. Create the sync command channel
    let (sync_tx, sync_rx) = mpsc::channel(16);

    // 6. Spawn the sync worker task
    let worker = tokio::spawn(sync::run_worker(
        sync_rx,
        reqwest::Client::new(),
        config.sync.players_url.clone(),
        store.clone(),
    ));

    // 7. Run the HTTP server until ctrl-c
    let ctx = server::AppContext {
        store,
        model: Arc::new(model),
        llm: config.llm.clone(),
        sync_tx,
    };
    server::serve(ctx, config.port).await?;

    // The server dropped its sync sender; the worker drains and exits.
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), worker).await;

    info!("Keeper assistant shut down cleanly");
    Ok(())
}

/// Initialize tracing to stderr with an env-filter override.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("keeper_assistant=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
