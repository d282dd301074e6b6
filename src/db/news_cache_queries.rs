use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::{CachedSummaryRow, CreateCachedSummary};

/// Fetch the daily summary row for a (cache_date, category, url) key
pub async fn get_cached_summary(
    pool: &PgPool,
    cache_date: NaiveDate,
    category: &str,
    url: &str,
) -> Result<Option<CachedSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, CachedSummaryRow>(
        r#"
        SELECT * FROM news_summary_cache
        WHERE cache_date = $1 AND category = $2 AND url = $3
        "#,
    )
    .bind(cache_date)
    .bind(category)
    .bind(url)
    .fetch_optional(pool)
    .await
}

/// Insert or replace the daily summary row for its key. Callers never need
/// to know which occurred; the stored row is always the latest write.
pub async fn upsert_cached_summary(
    pool: &PgPool,
    summary: CreateCachedSummary,
) -> Result<CachedSummaryRow, sqlx::Error> {
    sqlx::query_as::<_, CachedSummaryRow>(
        r#"
        INSERT INTO news_summary_cache
            (id, cache_date, market, category, url, source, title, payload_json)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (cache_date, category, url)
        DO UPDATE SET
            market = EXCLUDED.market,
            source = EXCLUDED.source,
            title = EXCLUDED.title,
            payload_json = EXCLUDED.payload_json,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(summary.cache_date)
    .bind(summary.market)
    .bind(summary.category)
    .bind(summary.url)
    .bind(summary.source)
    .bind(summary.title)
    .bind(summary.payload_json)
    .fetch_one(pool)
    .await
}
