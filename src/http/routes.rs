use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Chat history
        .route("/chat/:chat_id/getMessages", get(handlers::get_messages))
        .route("/chat/:chat_id/total", get(handlers::get_message_count))
        .route("/get_messages", post(handlers::get_first_chat_messages))
        // Chat listing
        .route("/chats/total", get(handlers::get_chat_count))
        .route("/get_chats", get(handlers::get_chats))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
