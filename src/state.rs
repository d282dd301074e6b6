use std::sync::Arc;
use sqlx::PgPool;

use crate::services::chat_service::ChatService;
use crate::services::news_feed_service::NewsFeedService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub news_feed: Arc<NewsFeedService>,
    pub chat: Arc<ChatService>,
}
