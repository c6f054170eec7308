//! HTTP API over chats, messages, and search.
//!
//! Thin glue: routing and request/response shapes only. All question
//! answering happens in [`crate::ask`]; blocking core work runs on the
//! blocking thread pool.

pub mod chat;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::sync::Mutex as TokioMutex;

use crate::ask::AskPipeline;
use crate::config::Config;
use crate::db::Db;
use crate::retriever::Retriever;

/// Shared application context available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<TokioMutex<Db>>,
    pub pipeline: Arc<AskPipeline>,
    pub retriever: Arc<Retriever>,
    pub config: Arc<Config>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(chat::root))
        .route("/chat/chats", get(chat::list_chats).post(chat::create_chat))
        .route("/chat/:chat_id/messages", get(chat::get_messages))
        .route("/chat/:chat_id/message", post(chat::create_message))
        .route("/search", post(chat::search))
        .with_state(state)
}
