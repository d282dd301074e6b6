mod app;
mod db;
mod errors;
mod logging;
mod models;
mod routes;
mod services;
mod state;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use crate::services::chat_service::ChatService;
use crate::services::llm_gateway::{LlmConfig, LlmGateway};
use crate::services::news_feed_service::{NewsFeedService, PgSummaryCacheStore};
use crate::services::scraper_service::{ScraperConfig, ScraperService};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    logging::init_logging(logging::LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    let llm_config = LlmConfig::from_env();
    tracing::info!(
        "LLM gateway: provider={}, max_concurrency={}",
        llm_config.provider,
        llm_config.max_concurrency
    );
    let gateway = Arc::new(LlmGateway::from_config(&llm_config));

    let scraper = Arc::new(ScraperService::new(ScraperConfig::from_env()));
    let cache = Arc::new(PgSummaryCacheStore::new(pool.clone()));

    let state = AppState {
        pool: pool.clone(),
        news_feed: Arc::new(NewsFeedService::new(scraper, gateway.clone(), cache)),
        chat: Arc::new(ChatService::new(pool, gateway)),
    };

    let app = app::create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("FinPulse backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
