use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::chat::models::{ChatReply, ChatRequest, ConversationHistory};
use crate::chat::relay::validate_conversation_id;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let Json(req) =
        payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    let turn = req.into_turn(&state.config);
    let reply = state.sessions.handle_message(turn).await?;
    Ok(Json(reply))
}

/// GET /api/v1/conversations/:id
pub async fn handle_get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationHistory>, AppError> {
    let conversation_id = validate_conversation_id(id)?;
    let messages = state.sessions.store().get(&conversation_id).await;
    Ok(Json(ConversationHistory {
        conversation_id,
        messages,
    }))
}
