use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ChatMessage, CreateChatMessage};

pub async fn add_message(
    pool: &PgPool,
    message: CreateChatMessage,
) -> Result<ChatMessage, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(
        r#"
        INSERT INTO chat_messages (id, user_id, role, content)
        VALUES (gen_random_uuid(), $1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(message.user_id)
    .bind(message.role)
    .bind(message.content)
    .fetch_one(pool)
    .await
}

/// Last `limit` messages for a user in chronological order
pub async fn get_last_messages(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    let mut messages = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT * FROM chat_messages
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    messages.reverse();
    Ok(messages)
}
