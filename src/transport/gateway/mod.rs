//! Axum HTTP front end for the chat relay.
//!
//! - `POST /api/chat`  `{session_id, message}` -> `{reply}`
//! - `POST /api/reset` `{session_id}` -> `{status: "reset"}`
//! - `GET  /health`    -> `{status, sessions, backend}`
//!
//! Request bodies are size-limited and whole requests time out at the HTTP
//! layer; generation has its own shorter timeout inside [`ChatService`].

mod handlers;
mod server;

pub use server::{build_app, run_gateway, run_gateway_with_listener, serve, shutdown_signal};

use crate::chat::ChatService;
use serde::Deserialize;
use std::sync::Arc;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: Arc<ChatService>) -> Self {
        Self { chat }
    }
}

/// `POST /api/chat` body. Unknown fields (e.g. a frontend `mode`) are ignored.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// `POST /api/reset` body
#[derive(Debug, Deserialize)]
pub struct ResetBody {
    #[serde(default)]
    pub session_id: Option<String>,
}
