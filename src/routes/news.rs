use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;
use uuid::Uuid;

use crate::db::user_queries;
use crate::errors::AppError;
use crate::models::{NewsBlock, NewsFeedParams};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/feed", get(get_news_feed))
}

/// GET /api/news/feed
///
/// Personal news feed for the current day.
///
/// Query parameters:
/// - `force`: bypass the daily cache and re-summarize (default: false)
///
/// Identity arrives in the `X-User-Id` header; the JWT layer in front of
/// this service resolves the token and forwards the id.
async fn get_news_feed(
    headers: HeaderMap,
    Query(params): Query<NewsFeedParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsBlock>>, AppError> {
    let user_id = current_user_id(&headers)?;
    let force = params.force.unwrap_or(false);

    info!("GET /api/news/feed - user {} (force={})", user_id, force);

    let user = user_queries::get_user_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let blocks = state.news_feed.execute(&user, force).await?;

    Ok(Json(blocks))
}

pub(crate) fn current_user_id(headers: &HeaderMap) -> Result<Uuid, AppError> {
    headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or(AppError::Unauthorized)
}
