use anyhow::Context;
use skyfare_api::{app, AppState};
use skyfare_core::repository::HistoryRepository;
use skyfare_offer::FareEngine;
use skyfare_store::{Config, HistoryStore, HttpCollaborators, LoadOutcome, MemoryRepository, RedisClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyfare_api=debug,skyfare_offer=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Skyfare API on port {}", config.server.port);

    // History persistence
    let repo: Arc<dyn HistoryRepository> = match &config.redis {
        Some(redis) => {
            let client = RedisClient::new(&redis.url)
                .await
                .context("Failed to create Redis client")?;
            Arc::new(client)
        }
        None => {
            tracing::warn!("No redis configured, search history will not survive restarts");
            Arc::new(MemoryRepository::new())
        }
    };
    let (history, outcome) = HistoryStore::init(repo, &config.history).await;
    if let LoadOutcome::Loaded(count) = outcome {
        tracing::info!("Restored {} saved searches", count);
    }

    // Upstream collaborators
    let upstream = Arc::new(HttpCollaborators::new(&config.upstream).context("Failed to build HTTP client")?);
    tracing::info!("Upstream at {}", config.upstream.base_url);

    let engine = FareEngine::new(
        upstream.clone(),
        upstream.clone(),
        upstream,
        Arc::new(history),
        config.upstream.request_timeout(),
    );

    let app = app(AppState::new(engine));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
