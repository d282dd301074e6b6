use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::chat_queries;
use crate::errors::AppError;
use crate::models::{ChatMessage, CreateChatMessage};
use crate::services::llm_gateway::LlmGateway;
use crate::utils::text::CHAT_CONTEXT_MAX_CHARS;

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "finpulse";

/// How many stored messages are considered for context assembly
const CONTEXT_MESSAGE_LIMIT: i64 = 50;

const SYSTEM_PROMPT: &str = "Ты — FinPulse, финансовый ИИ-ассистент, который помогает людям \
лучше понимать рынки, новости и собственные финансы.\n\n";

/// Assemble the model context from chat history. Walks messages newest
/// first and stops once the next chunk would break the character budget,
/// so the most recent exchange always survives. Pure and deterministic.
pub fn build_chat_context(messages: &[ChatMessage]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut total_len = 0usize;

    for msg in messages.iter().rev() {
        let prefix = if msg.role == ROLE_USER { "User: " } else { "FinPulse: " };
        let chunk = format!("{}{}\n", prefix, msg.content);
        let chunk_len = chunk.chars().count();

        if total_len + chunk_len > CHAT_CONTEXT_MAX_CHARS {
            break;
        }

        parts.push(chunk);
        total_len += chunk_len;
    }

    parts.reverse();

    format!("{}{}", SYSTEM_PROMPT, parts.join(""))
}

/// Chat flow: persist the user's message, assemble context, call the
/// gateway, persist and return the reply.
pub struct ChatService {
    pool: PgPool,
    gateway: Arc<LlmGateway>,
}

impl ChatService {
    pub fn new(pool: PgPool, gateway: Arc<LlmGateway>) -> Self {
        Self { pool, gateway }
    }

    pub async fn chat(&self, user_id: Uuid, user_message: String) -> Result<String, AppError> {
        chat_queries::add_message(
            &self.pool,
            CreateChatMessage {
                user_id,
                role: ROLE_USER.to_string(),
                content: user_message,
            },
        )
        .await?;

        let history =
            chat_queries::get_last_messages(&self.pool, user_id, CONTEXT_MESSAGE_LIMIT).await?;

        let prompt = build_chat_context(&history);
        info!(
            "Chat context for user {}: {} messages, {} chars",
            user_id,
            history.len(),
            prompt.len()
        );

        let reply = self.gateway.generate(prompt).await?;

        chat_queries::add_message(
            &self.pool,
            CreateChatMessage {
                user_id,
                role: ROLE_ASSISTANT.to_string(),
                content: reply.clone(),
            },
        )
        .await?;

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(role: &str, content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: role.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn context_keeps_chronological_order() {
        let messages = vec![
            message(ROLE_USER, "Что с рублём?"),
            message(ROLE_ASSISTANT, "Рубль укрепился."),
            message(ROLE_USER, "А с акциями?"),
        ];

        let context = build_chat_context(&messages);

        let rub = context.find("Что с рублём?").unwrap();
        let reply = context.find("Рубль укрепился.").unwrap();
        let stocks = context.find("А с акциями?").unwrap();
        assert!(rub < reply && reply < stocks);
        assert!(context.starts_with("Ты — FinPulse"));
    }

    #[test]
    fn context_prefixes_roles() {
        let messages = vec![
            message(ROLE_USER, "привет"),
            message(ROLE_ASSISTANT, "здравствуйте"),
        ];
        let context = build_chat_context(&messages);
        assert!(context.contains("User: привет"));
        assert!(context.contains("FinPulse: здравствуйте"));
    }

    #[test]
    fn budget_drops_oldest_messages_first() {
        let old = message(ROLE_USER, &"с".repeat(7_000));
        let recent = message(ROLE_USER, &"н".repeat(4_000));

        let context = build_chat_context(&[old, recent]);

        assert!(context.contains(&"н".repeat(4_000)));
        assert!(!context.contains(&"с".repeat(7_000)));
    }

    #[test]
    fn empty_history_is_just_the_system_prompt() {
        let context = build_chat_context(&[]);
        assert_eq!(context, SYSTEM_PROMPT);
    }
}
