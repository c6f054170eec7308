//! Chat and search handlers.
//!
//! Responses carry a `code` field in the body alongside the HTTP status,
//! which the frontend keys on.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

use super::AppState;
use crate::ask::{AskOutcome, NO_SECTIONS_MESSAGE};
use crate::db::models::SenderType;

#[derive(Deserialize)]
pub struct CreateChatParams {
    pub chat_title: String,
}

#[derive(Deserialize)]
pub struct MessageQuery {
    pub question: String,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub question: String,
    pub top_k: Option<usize>,
}

/// `GET /` — health check.
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Server is running" }))
}

/// `GET /chat/chats`
pub async fn list_chats(State(state): State<AppState>) -> Json<Value> {
    let db = state.db.lock().await;
    match db.list_chats() {
        Ok(chats) => Json(json!({ "code": 200, "chats": chats })),
        Err(e) => {
            error!("failed to list chats: {e}");
            Json(json!({ "code": 500, "error": "failed to list chats" }))
        }
    }
}

/// `POST /chat/chats`
pub async fn create_chat(
    State(state): State<AppState>,
    Json(params): Json<CreateChatParams>,
) -> Json<Value> {
    if params.chat_title.trim().is_empty() {
        return Json(json!({ "code": 400, "error": "chat_title is required" }));
    }

    let db = state.db.lock().await;
    match db.create_chat(params.chat_title.trim()) {
        Ok(chat) => Json(json!({ "code": 200, "chat": chat })),
        Err(e) => {
            error!("failed to create chat: {e}");
            Json(json!({ "code": 500, "error": "failed to create chat" }))
        }
    }
}

/// `GET /chat/{chat_id}/messages`
pub async fn get_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Json<Value> {
    let db = state.db.lock().await;

    match db.get_chat(&chat_id) {
        Ok(Some(_)) => {}
        Ok(None) => return Json(json!({ "code": 404, "error": "Chat not found" })),
        Err(e) => {
            error!("failed to look up chat: {e}");
            return Json(json!({ "code": 500, "error": "failed to look up chat" }));
        }
    }

    match db.list_messages(&chat_id) {
        Ok(messages) => Json(json!({ "code": 200, "messages": messages })),
        Err(e) => {
            error!("failed to list messages: {e}");
            Json(json!({ "code": 500, "error": "failed to list messages" }))
        }
    }
}

/// `POST /chat/{chat_id}/message?question=...`
///
/// Runs the full pipeline for one question and persists the user/assistant
/// message pair on success.
pub async fn create_message(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Json<Value> {
    let question = query.question.trim().to_string();
    if question.is_empty() {
        return Json(json!({ "code": 400, "answer": "Please provide a valid question." }));
    }

    // Chat must exist; its recent history grounds the prompt
    let chat_history = {
        let db = state.db.lock().await;
        match db.get_chat(&chat_id) {
            Ok(Some(_)) => {}
            Ok(None) => return Json(json!({ "code": 404, "error": "Chat not found" })),
            Err(e) => {
                error!("failed to look up chat: {e}");
                return Json(json!({ "code": 500, "error": "failed to look up chat" }));
            }
        }

        match db.recent_messages(&chat_id, state.config.history_window) {
            Ok(messages) if messages.is_empty() => None,
            Ok(messages) => Some(crate::db::history::format_chat_history(&messages)),
            Err(e) => {
                error!("failed to read chat history: {e}");
                None
            }
        }
    };

    let pipeline = state.pipeline.clone();
    let pipeline_question = question.clone();
    let result = tokio::task::spawn_blocking(move || {
        pipeline.answer(&pipeline_question, chat_history.as_deref())
    })
    .await;

    let outcome = match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            error!("pipeline failed: {e}");
            return Json(json!({ "code": 502, "error": e.to_string() }));
        }
        Err(e) => {
            error!("pipeline task panicked: {e}");
            return Json(json!({ "code": 500, "error": "internal error" }));
        }
    };

    match outcome {
        AskOutcome::Answered(answer) | AskOutcome::ToolMessage(answer) => {
            let db = state.db.lock().await;
            let stored = db
                .insert_message(&chat_id, &question, SenderType::User)
                .and_then(|_| db.insert_message(&chat_id, &answer, SenderType::System));
            if let Err(e) = stored {
                error!("failed to persist messages: {e}");
            }
            Json(json!({ "code": 200, "answer": answer }))
        }
        AskOutcome::NoSections => {
            Json(json!({ "code": 204, "answer": NO_SECTIONS_MESSAGE }))
        }
    }
}

/// `POST /search` — ranked sections for a question.
pub async fn search(
    State(state): State<AppState>,
    Json(params): Json<SearchParams>,
) -> Json<Value> {
    if params.question.trim().is_empty() {
        return Json(json!({ "code": 400, "error": "question is required" }));
    }

    let retriever = state.retriever.clone();
    let top_k = params.top_k.unwrap_or(state.config.search_top_k);
    let question = params.question;

    let result =
        tokio::task::spawn_blocking(move || retriever.search(&question, top_k)).await;

    match result {
        Ok(Ok(sections)) => Json(json!({ "code": 200, "sections": sections })),
        Ok(Err(e)) => {
            error!("search failed: {e}");
            Json(json!({ "code": 502, "error": e.to_string() }))
        }
        Err(e) => {
            error!("search task panicked: {e}");
            Json(json!({ "code": 500, "error": "internal error" }))
        }
    }
}
