use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{ChatRequest, ChatResponse};
use crate::routes::news::current_user_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(chat))
}

/// POST /api/chat
///
/// Send a message to the assistant; the reply is grounded in the user's
/// recent chat history.
async fn chat(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let user_id = current_user_id(&headers)?;

    if request.message.trim().is_empty() {
        return Err(AppError::Validation("Message must not be empty".to_string()));
    }

    info!("POST /api/chat - user {}", user_id);

    let reply = state.chat.chat(user_id, request.message).await?;

    Ok(Json(ChatResponse { reply }))
}
