use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::news_cache_queries;
use crate::errors::AppError;
use crate::models::{
    CachedSummaryRow, CreateCachedSummary, NewsBlock, NewsCategory, SummaryPayload, User,
};
use crate::services::llm_gateway::LlmGateway;
use crate::services::news_sources::{pick_sources, DEFAULT_MARKET, MAX_FEED_BLOCKS};
use crate::services::overlay::apply_ticker_overlay;
use crate::services::prompt_builder::build_news_prompt;
use crate::services::response_validator::validate_llm_reply;
use crate::services::scraper_service::ContentFetcher;
use crate::utils::text::{normalize_text, SUMMARY_INPUT_MAX_CHARS};

/// Placeholder when neither the LLM summary nor the synthesized sections
/// produced any text. The feed never returns a block with an empty summary.
pub const NO_DATA_SUMMARY: &str = "Нет данных для обзора.";

/// Daily summary persistence, keyed by (cache_date, category, url).
/// Upsert-by-key: concurrent first-writes for one key race and the last
/// write lands, but never a duplicate row or a crash.
#[async_trait]
pub trait SummaryCacheStore: Send + Sync {
    async fn get(
        &self,
        cache_date: NaiveDate,
        category: &str,
        url: &str,
    ) -> Result<Option<CachedSummaryRow>, AppError>;

    async fn upsert(&self, summary: CreateCachedSummary) -> Result<CachedSummaryRow, AppError>;
}

/// Postgres-backed store used in production
pub struct PgSummaryCacheStore {
    pool: PgPool,
}

impl PgSummaryCacheStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SummaryCacheStore for PgSummaryCacheStore {
    async fn get(
        &self,
        cache_date: NaiveDate,
        category: &str,
        url: &str,
    ) -> Result<Option<CachedSummaryRow>, AppError> {
        news_cache_queries::get_cached_summary(&self.pool, cache_date, category, url)
            .await
            .map_err(AppError::Db)
    }

    async fn upsert(&self, summary: CreateCachedSummary) -> Result<CachedSummaryRow, AppError> {
        news_cache_queries::upsert_cached_summary(&self.pool, summary)
            .await
            .map_err(AppError::Db)
    }
}

/// Assembles the personal news feed: selects sources, resolves each one
/// from the daily cache or a fresh LLM summarization, overlays the user's
/// tickers, and emits ordered blocks. All collaborators are injected.
pub struct NewsFeedService {
    fetcher: Arc<dyn ContentFetcher>,
    gateway: Arc<LlmGateway>,
    cache: Arc<dyn SummaryCacheStore>,
}

impl NewsFeedService {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        gateway: Arc<LlmGateway>,
        cache: Arc<dyn SummaryCacheStore>,
    ) -> Self {
        Self {
            fetcher,
            gateway,
            cache,
        }
    }

    /// Build up to three news blocks for the user. A failing source is
    /// skipped with a warning; one bad source never fails the whole feed.
    pub async fn execute(&self, user: &User, force: bool) -> Result<Vec<NewsBlock>, AppError> {
        let today = Utc::now().date_naive();
        let tickers = user.watched_tickers();

        let picked = pick_sources(DEFAULT_MARKET, MAX_FEED_BLOCKS);
        if picked.is_empty() {
            return Ok(Vec::new());
        }

        let mut blocks: Vec<NewsBlock> = Vec::new();

        for (category, url) in picked {
            match self
                .resolve_block(today, DEFAULT_MARKET, category, url, &tickers, force)
                .await
            {
                Ok(block) => blocks.push(block),
                Err(e) => {
                    warn!("Skipping news block for {}: {}", url, e);
                }
            }
        }

        info!(
            "Assembled news feed: {} blocks for user {} (force={})",
            blocks.len(),
            user.id,
            force
        );

        Ok(blocks)
    }

    async fn resolve_block(
        &self,
        today: NaiveDate,
        market: &str,
        category: NewsCategory,
        url: &str,
        tickers: &[String],
        force: bool,
    ) -> Result<NewsBlock, AppError> {
        if !force {
            if let Some(row) = self.cache.get(today, category.as_str(), url).await? {
                info!("Daily cache hit for {} ({})", url, category);
                return Ok(build_block(
                    row.payload(),
                    tickers,
                    row.title,
                    row.source,
                    row.url,
                    row.cache_date,
                ));
            }
        }

        // Fetch failure degrades to an empty article; the model then
        // produces a low-information summary instead of the pipeline failing.
        let raw_text = self.fetcher.fetch_article_text(url).await.unwrap_or_default();
        let article = normalize_text(&raw_text, SUMMARY_INPUT_MAX_CHARS);

        let prompt = build_news_prompt(category, &article);
        let reply = self.gateway.generate(prompt).await?;
        let payload = validate_llm_reply(&reply);

        let title = block_title(market, category);
        let source = source_host(url);
        let payload_json = serde_json::to_string(&payload)
            .map_err(|e| AppError::External(format!("Failed to serialize payload: {}", e)))?;

        let row = self
            .cache
            .upsert(CreateCachedSummary {
                cache_date: today,
                market: market.to_string(),
                category: category.as_str().to_string(),
                url: url.to_string(),
                source,
                title,
                payload_json,
            })
            .await?;

        Ok(build_block(
            payload,
            tickers,
            row.title,
            row.source,
            row.url,
            row.cache_date,
        ))
    }
}

fn build_block(
    payload: SummaryPayload,
    tickers: &[String],
    title: String,
    source: String,
    url: String,
    asof: NaiveDate,
) -> NewsBlock {
    let payload = apply_ticker_overlay(payload, tickers);
    let summary = derive_summary(&payload);

    NewsBlock {
        title,
        source,
        url,
        summary,
        bullets: payload.facts,
        conclusion: payload.conclusion,
        risks: payload.risks,
        indicator: payload.indicator,
        asof: Some(asof),
    }
}

/// LLM summary verbatim when present; otherwise synthesized from the
/// bullet/conclusion/risk sections; otherwise the fixed placeholder.
fn derive_summary(payload: &SummaryPayload) -> String {
    if let Some(summary) = &payload.summary {
        if !summary.trim().is_empty() {
            return summary.clone();
        }
    }

    let mut parts: Vec<String> = Vec::new();

    if !payload.facts.is_empty() {
        parts.push(payload.facts.join("; "));
    }
    if let Some(conclusion) = &payload.conclusion {
        parts.push(format!("Вывод: {}", conclusion));
    }
    if !payload.risks.is_empty() {
        parts.push(format!("Риски: {}", payload.risks.join("; ")));
    }

    let synthesized = parts.join("\n");
    if synthesized.is_empty() {
        NO_DATA_SUMMARY.to_string()
    } else {
        synthesized
    }
}

fn block_title(market: &str, category: NewsCategory) -> String {
    format!(
        "{} / {} — обзор новостей",
        capitalize(market),
        capitalize(category.as_str())
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn source_host(raw_url: &str) -> String {
    url::Url::parse(raw_url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_else(|| raw_url.to_string())
}
