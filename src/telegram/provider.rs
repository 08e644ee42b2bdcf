use super::types::{ChatMessage, ChatSummary, DialogQuery, Page};
use anyhow::Result;

/// Messaging provider backing the gateway
///
/// Implementations are not expected to be safe for concurrent use: the
/// gateway worker owns exactly one provider and drives it one call at a time.
/// - `TelegramClient`: live MTProto connection
/// - test doubles: in-memory chats
#[async_trait::async_trait]
pub trait ChatProvider: Send {
    /// List dialogs, newest activity first
    ///
    /// `query.limit == 0` returns no items but still reports the total.
    async fn dialogs(&mut self, query: &DialogQuery) -> Result<Page<ChatSummary>>;

    /// Message history of `chat_id` (marked id), newest first
    ///
    /// Only messages older than `offset_id` are returned when it is non-zero.
    /// `limit == 0` returns no items but still reports the total.
    async fn messages(&mut self, chat_id: i64, limit: usize, offset_id: i32)
        -> Result<Page<ChatMessage>>;

    /// Persist state and close the connection
    async fn disconnect(&mut self) -> Result<()>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
