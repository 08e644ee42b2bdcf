// In-memory provider shared by the integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use telegram_gateway::{ChatMessage, ChatProvider, ChatSummary, DialogQuery, Page};

/// Observations shared between a test and the provider it handed to the gateway
#[derive(Default)]
pub struct CallStats {
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub disconnected: AtomicBool,
}

pub struct FakeChat {
    pub summary: ChatSummary,
    /// Newest first
    pub messages: Vec<ChatMessage>,
}

pub struct FakeProvider {
    pub chats: Vec<FakeChat>,
    pub fail: bool,
    pub delay: Duration,
    pub stats: Arc<CallStats>,
}

impl FakeProvider {
    pub fn new(chats: Vec<FakeChat>) -> Self {
        Self {
            chats,
            fail: false,
            delay: Duration::ZERO,
            stats: Arc::new(CallStats::default()),
        }
    }

    async fn enter(&self) -> Result<()> {
        self.stats.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            bail!("FLOOD_WAIT_30");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChatProvider for FakeProvider {
    async fn dialogs(&mut self, query: &DialogQuery) -> Result<Page<ChatSummary>> {
        self.enter().await?;

        let items = self
            .chats
            .iter()
            .map(|c| c.summary.clone())
            .take(query.limit)
            .collect();

        Ok(Page {
            items,
            total: self.chats.len(),
        })
    }

    async fn messages(
        &mut self,
        chat_id: i64,
        limit: usize,
        offset_id: i32,
    ) -> Result<Page<ChatMessage>> {
        self.enter().await?;

        let chat = match self.chats.iter().find(|c| c.summary.id == chat_id) {
            Some(chat) => chat,
            None => bail!("Could not find the input entity for chat {}", chat_id),
        };

        let items = chat
            .messages
            .iter()
            .filter(|m| offset_id == 0 || m.id < offset_id)
            .take(limit)
            .cloned()
            .collect();

        Ok(Page {
            items,
            total: chat.messages.len(),
        })
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.stats.disconnected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub fn date(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap()
}

pub fn chat(id: i64, name: &str, is_group: bool, is_channel: bool, message_count: i32) -> FakeChat {
    let messages = (1..=message_count)
        .rev()
        .map(|id| ChatMessage {
            id,
            sender_id: Some(1000 + id as i64),
            message: Some(format!("message {}", id)),
            date: date(id as u32 % 60),
            whole_msg: format!("Message {{ id: {} }}", id),
        })
        .collect();

    FakeChat {
        summary: ChatSummary {
            id,
            name: name.to_string(),
            is_group,
            is_channel,
            date: Some(date(0)),
            whole_dialog: format!("Dialog {{ id: {} }}", id),
        },
        messages,
    }
}

/// Direct chat, basic group, supergroup, broadcast channel, empty chat
pub fn sample_chats() -> Vec<FakeChat> {
    vec![
        chat(12345, "Alice", false, false, 12),
        chat(-777, "Book Club", true, false, 3),
        chat(-1001234567890, "Engineering", true, true, 40),
        chat(-1009876543210, "Announcements", false, true, 7),
        chat(555, "Quiet Bob", false, false, 0),
    ]
}
