use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use diary_notifier::config::{Config, StoreBackend};
use diary_notifier::db::{self, Database};
use diary_notifier::diary::{self, Pipeline, PipelineOptions};
use diary_notifier::notify;
use diary_notifier::store::{MemoryStore, SeenStore};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    init_tracing()?;

    info!("Starting diary-notifier");

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        source_url = %config.source_url,
        interval_secs = config.poll_interval.as_secs(),
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let store = open_store(&config).await?;
    let notifier = notify::from_config(&config, client.clone()).await?;
    let pipeline = Pipeline::new(
        client,
        PipelineOptions::from_config(&config),
        store,
        notifier,
    );

    let shutdown = CancellationToken::new();
    let mut poll_handle = tokio::spawn(diary::poll_loop(
        pipeline,
        config.poll_interval,
        shutdown.clone(),
    ));

    let joined = tokio::select! {
        () = shutdown_signal() => {
            info!("Shutting down, waiting for the current cycle to finish...");
            shutdown.cancel();
            poll_handle.await
        }
        joined = &mut poll_handle => joined,
    };

    let result: Result<()> = match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e).context("Diary polling failed"),
        Err(e) => Err(e).context("Diary polling task panicked"),
    };

    info!("Bye!");
    result
}

async fn open_store(config: &Config) -> Result<Arc<dyn SeenStore>> {
    match config.store_backend {
        StoreBackend::Sqlite => {
            if let Some(parent) = config.database_path.parent() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }

            let db = Database::new(&config.database_path)
                .await
                .context("Failed to initialize database")?;
            let known = db::count_posts(db.pool()).await?;
            match db.last_delivered().await? {
                Some(last) => info!(
                    known_posts = known,
                    last = %last,
                    "Resuming after last delivered post"
                ),
                None => info!("No posts delivered yet"),
            }
            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            info!("Using in-memory seen-post store; history is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,diary_notifier=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
