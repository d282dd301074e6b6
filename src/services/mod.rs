pub mod chat_service;
pub mod llm_gateway;
pub mod news_feed_service;
pub mod news_sources;
pub mod overlay;
pub mod prompt_builder;
pub mod response_validator;
pub mod scraper_service;
