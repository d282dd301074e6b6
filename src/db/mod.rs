pub mod chat_queries;
pub mod news_cache_queries;
pub mod user_queries;
