mod chat;
mod news;
mod summary;
mod user;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, CreateChatMessage};
pub use news::{Confidence, Impact, NewsBlock, NewsFeedParams, NewsIndicator};
pub use summary::{CachedSummaryRow, CreateCachedSummary, NewsCategory, SummaryPayload};
pub use user::User;
