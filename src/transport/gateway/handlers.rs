use crate::error::{ChatError, SessionError};
use crate::model::sanitize_error_text;
use crate::session::SessionId;
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::Value;
use tracing::Instrument;

use super::{AppState, ChatBody, ResetBody};

type JsonResponse = (StatusCode, Json<Value>);

fn error_response(status: StatusCode, message: impl Into<String>) -> JsonResponse {
    let message: String = message.into();
    (status, Json(serde_json::json!({ "error": message })))
}

fn invalid_json_response(rejection: &JsonRejection, expected: &str) -> JsonResponse {
    tracing::warn!(error = %rejection.body_text(), "rejected malformed request body");
    error_response(
        StatusCode::BAD_REQUEST,
        format!("Invalid JSON: {}. Expected: {expected}", rejection.body_text()),
    )
}

fn invalid_session_response(err: &SessionError) -> JsonResponse {
    tracing::warn!(error = %err, "rejected request with invalid session id");
    error_response(StatusCode::BAD_REQUEST, err.to_string())
}

pub(super) fn status_for(err: &ChatError) -> StatusCode {
    match err {
        ChatError::Session(SessionError::InvalidId(_)) => StatusCode::BAD_REQUEST,
        ChatError::Session(SessionError::CapacityExhausted { .. }) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ChatError::ContextExhausted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ChatError::Tokenizer(_) | ChatError::Generation(_) => StatusCode::BAD_GATEWAY,
        ChatError::GenerationTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn chat_error_response(err: &ChatError) -> JsonResponse {
    let status = status_for(err);
    let message = match err {
        // Backend error text stays in the logs.
        ChatError::Tokenizer(_) | ChatError::Generation(_) => {
            tracing::error!(
                status = status.as_u16(),
                error = %sanitize_error_text(&err.to_string()),
                "chat request failed"
            );
            "Model backend request failed".to_string()
        }
        _ => {
            tracing::warn!(status = status.as_u16(), error = %err, "chat request rejected");
            err.to_string()
        }
    };
    error_response(status, message)
}

/// GET /health
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "sessions": state.chat.sessions().len(),
        "backend": state.chat.backend_name(),
    });
    Json(body)
}

/// POST /api/chat
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => {
            return invalid_json_response(
                &e,
                r#"{"session_id": "...", "message": "..."}"#,
            );
        }
    };
    let id = match SessionId::require(body.session_id.as_deref()) {
        Ok(id) => id,
        Err(e) => return invalid_session_response(&e),
    };

    let span = tracing::info_span!(
        "chat",
        request_id = %uuid::Uuid::new_v4(),
        session = %id,
        message_chars = body.message.chars().count(),
    );
    match state.chat.chat(&id, &body.message).instrument(span).await {
        Ok(reply) => (StatusCode::OK, Json(serde_json::json!({ "reply": reply }))),
        Err(e) => chat_error_response(&e),
    }
}

/// POST /api/reset
pub(super) async fn handle_reset(
    State(state): State<AppState>,
    body: Result<Json<ResetBody>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return invalid_json_response(&e, r#"{"session_id": "..."}"#),
    };
    let id = match SessionId::require(body.session_id.as_deref()) {
        Ok(id) => id,
        Err(e) => return invalid_session_response(&e),
    };

    let span = tracing::info_span!("reset", request_id = %uuid::Uuid::new_v4(), session = %id);
    state.chat.reset(&id).instrument(span).await;
    (StatusCode::OK, Json(serde_json::json!({ "status": "reset" })))
}
