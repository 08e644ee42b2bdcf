use super::error::ApiError;
use super::params::{self, QueryMap};
use super::state::AppState;
use crate::telegram::{ChatFilter, ChatMessage, ChatSummary, DialogQuery, MessagePreview};
use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

const DEFAULT_MESSAGES_LIMIT: usize = 5;
const DEFAULT_FIRST_CHAT_MESSAGES: usize = 20;
const DEFAULT_CHATS_LIMIT: usize = 10;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<ChatMessage>,
    #[serde(rename = "chatId")]
    pub chat_id: i64,
    pub limit: usize,
    pub from: i32,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageCountResponse {
    #[serde(rename = "chatId")]
    pub chat_id: i64,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ChatCountResponse {
    pub total_chats: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /chat/:chat_id/getMessages?limit=&from=
/// Page of a chat's history (newest first) plus the chat's total
pub async fn get_messages(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<QueryMap>, QueryRejection>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let chat_id = parse_chat_id(path)?;
    let Query(query) = query.map_err(|e| log_error(e.into()))?;
    let limit = params::int_or(&query, "limit", DEFAULT_MESSAGES_LIMIT).map_err(log_error)?;
    let from = params::int_or(&query, "from", 0).map_err(log_error)?;

    info!("Fetching messages: chat={} limit={} from={}", chat_id, limit, from);

    let history = state
        .gateway
        .history(chat_id, limit, from)
        .await
        .map_err(|e| log_error(e.into()))?;

    Ok(Json(MessagesResponse {
        messages: history.messages,
        chat_id,
        limit,
        from,
        total: history.total,
    }))
}

/// GET /chat/:chat_id/total
/// Total number of messages in a chat
pub async fn get_message_count(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageCountResponse>, ApiError> {
    let chat_id = parse_chat_id(path)?;

    let total = state
        .gateway
        .message_count(chat_id)
        .await
        .map_err(|e| log_error(e.into()))?;

    Ok(Json(MessageCountResponse { chat_id, total }))
}

/// GET /chats/total
/// Total number of dialogs on the account
pub async fn get_chat_count(
    State(state): State<AppState>,
) -> Result<Json<ChatCountResponse>, ApiError> {
    let total_chats = state
        .gateway
        .chat_count()
        .await
        .map_err(|e| log_error(e.into()))?;

    Ok(Json(ChatCountResponse { total_chats }))
}

/// POST /get_messages  {"num_messages": 20}
/// Latest messages of the most recently active chat
pub async fn get_first_chat_messages(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<MessagePreview>>, ApiError> {
    let limit = num_messages(&body).map_err(log_error)?;

    info!("Fetching {} messages from the first chat", limit);

    match state
        .gateway
        .first_chat_messages(limit)
        .await
        .map_err(|e| log_error(e.into()))?
    {
        Some(messages) => Ok(Json(messages)),
        None => Err(log_error(ApiError::NoChats)),
    }
}

/// GET /get_chats?limit=&offset_id=&offset_date=&ignore_pinned=&ignore_migrated=&folder=&archived=&filter=
/// Page of dialogs, type filter applied after the fetch
pub async fn get_chats(
    State(state): State<AppState>,
    query: Result<Query<QueryMap>, QueryRejection>,
) -> Result<Json<Vec<ChatSummary>>, ApiError> {
    let Query(query) = query.map_err(|e| log_error(e.into()))?;
    let dialog_query = dialog_query(&query).map_err(log_error)?;
    let filter = query.get("filter").and_then(|f| ChatFilter::parse(f.trim()));

    info!("Fetching chats: {:?} filter={:?}", dialog_query, filter);

    let page = state
        .gateway
        .chats(dialog_query)
        .await
        .map_err(|e| log_error(e.into()))?;

    Ok(Json(ChatFilter::retain(filter, page.items)))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_chat_id(path: Result<Path<String>, PathRejection>) -> Result<i64, ApiError> {
    let Path(raw) = path.map_err(|e| log_error(e.into()))?;
    params::parse_int("chatId", &raw).map_err(log_error)
}

fn dialog_query(query: &QueryMap) -> Result<DialogQuery, ApiError> {
    Ok(DialogQuery {
        limit: params::int_or(query, "limit", DEFAULT_CHATS_LIMIT)?,
        offset_id: params::int_or(query, "offset_id", 0)?,
        offset_date: params::opt_datetime(query, "offset_date")?,
        ignore_pinned: params::flag(query, "ignore_pinned")?,
        ignore_migrated: params::flag(query, "ignore_migrated")?,
        folder: params::opt_int(query, "folder")?,
        archived: params::opt_flag(query, "archived")?,
    })
}

/// `num_messages` from a JSON object body; empty body or missing field means 20
fn num_messages(body: &[u8]) -> Result<usize, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DEFAULT_FIRST_CHAT_MESSAGES);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadInput(format!("Invalid JSON body: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| ApiError::BadInput("Request body must be a JSON object".to_string()))?;

    match object.get("num_messages") {
        None | Some(Value::Null) => Ok(DEFAULT_FIRST_CHAT_MESSAGES),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| ApiError::BadInput(format!("Invalid value for 'num_messages': {}", n))),
        Some(Value::String(s)) => params::parse_int("num_messages", s),
        Some(other) => Err(ApiError::BadInput(format!(
            "Invalid value for 'num_messages': {}",
            other
        ))),
    }
}

fn log_error(e: ApiError) -> ApiError {
    error!("Request failed: {}", e);
    e
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_messages_defaults() {
        assert_eq!(num_messages(b"").unwrap(), 20);
        assert_eq!(num_messages(b"  \n").unwrap(), 20);
        assert_eq!(num_messages(b"{}").unwrap(), 20);
        assert_eq!(num_messages(br#"{"num_messages": null}"#).unwrap(), 20);
    }

    #[test]
    fn test_num_messages_values() {
        assert_eq!(num_messages(br#"{"num_messages": 3}"#).unwrap(), 3);
        assert_eq!(num_messages(br#"{"num_messages": "4"}"#).unwrap(), 4);
        assert!(num_messages(br#"{"num_messages": -1}"#).is_err());
        assert!(num_messages(br#"{"num_messages": "lots"}"#).is_err());
        assert!(num_messages(br#"{"num_messages": true}"#).is_err());
        assert!(num_messages(b"[1, 2]").is_err());
        assert!(num_messages(b"{not json").is_err());
    }

    #[test]
    fn test_dialog_query_defaults() {
        let query = dialog_query(&QueryMap::new()).unwrap();
        assert_eq!(query, DialogQuery::default());
        assert_eq!(query.limit, 10);
    }

    #[test]
    fn test_dialog_query_full() {
        let query: QueryMap = [
            ("limit", "25"),
            ("offset_id", "100"),
            ("offset_date", "2024-01-02T03:04:05"),
            ("ignore_pinned", "true"),
            ("ignore_migrated", "1"),
            ("folder", "0"),
            ("archived", "true"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let parsed = dialog_query(&query).unwrap();
        assert_eq!(parsed.limit, 25);
        assert_eq!(parsed.offset_id, 100);
        assert!(parsed.offset_date.is_some());
        assert!(parsed.ignore_pinned);
        assert!(parsed.ignore_migrated);
        assert_eq!(parsed.folder, Some(0));
        assert_eq!(parsed.folder_id(), Some(1));
    }
}
