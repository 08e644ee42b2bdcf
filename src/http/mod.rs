//! HTTP API over the Telegram account
//!
//! - GET /chat/:chat_id/getMessages - Page of a chat's history plus its total
//! - GET /chat/:chat_id/total - Total messages in a chat
//! - GET /chats/total - Total number of chats
//! - POST /get_messages - Latest messages of the most recently active chat
//! - GET /get_chats - Page of chats, optionally filtered by type
//! - GET /health - Health check
//!
//! Failures of any kind are HTTP 500 with `{"error": "..."}`.

mod error;
mod handlers;
mod params;
mod routes;
mod state;

pub use error::{ApiError, ErrorResponse};
pub use handlers::{ChatCountResponse, MessageCountResponse, MessagesResponse};
pub use routes::create_router;
pub use state::AppState;
