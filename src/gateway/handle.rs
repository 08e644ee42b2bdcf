use super::worker::{self, ChatHistory, Command};
use crate::telegram::{ChatProvider, ChatSummary, DialogQuery, MessagePreview, Page};
use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

/// Commands queued ahead of the worker before senders wait
const QUEUE_CAPACITY: usize = 64;

/// The worker stopped before it could answer
#[derive(Debug, thiserror::Error)]
pub enum WorkerUnavailable {
    #[error("Gateway worker is not running")]
    NotRunning,

    #[error("Gateway worker dropped the request")]
    DroppedRequest,
}

/// Cloneable entry point used by request handlers
#[derive(Clone)]
pub struct GatewayHandle {
    tx: mpsc::Sender<Command>,
}

/// Single worker that owns the provider connection
pub struct Gateway {
    handle: GatewayHandle,
    worker: JoinHandle<()>,
}

impl Gateway {
    /// Spawn the worker; the provider must already be connected
    pub fn spawn(provider: Box<dyn ChatProvider>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let worker = tokio::spawn(worker::run(provider, rx));

        Self {
            handle: GatewayHandle { tx },
            worker,
        }
    }

    pub fn handle(&self) -> GatewayHandle {
        self.handle.clone()
    }

    /// Disconnect the provider after already-queued commands finish
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down gateway worker");

        let (reply, rx) = oneshot::channel();
        let sent = self.handle.tx.send(Command::Shutdown { reply }).await.is_ok();
        drop(self.handle);

        let result = if sent {
            rx.await.map_err(|_| anyhow!("Gateway worker exited without confirming shutdown"))?
        } else {
            Ok(())
        };

        self.worker.await.context("Gateway worker panicked")?;
        result
    }
}

impl GatewayHandle {
    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| WorkerUnavailable::NotRunning)?;
        rx.await.map_err(|_| WorkerUnavailable::DroppedRequest)?
    }

    /// Messages of `chat_id` plus the chat's total message count
    pub async fn history(&self, chat_id: i64, limit: usize, offset_id: i32) -> Result<ChatHistory> {
        self.call(|reply| Command::History {
            chat_id,
            limit,
            offset_id,
            reply,
        })
        .await
    }

    pub async fn message_count(&self, chat_id: i64) -> Result<usize> {
        self.call(|reply| Command::MessageCount { chat_id, reply }).await
    }

    pub async fn chat_count(&self) -> Result<usize> {
        self.call(|reply| Command::ChatCount { reply }).await
    }

    /// `None` when the account has no chats
    pub async fn first_chat_messages(&self, limit: usize) -> Result<Option<Vec<MessagePreview>>> {
        self.call(|reply| Command::FirstChatMessages { limit, reply })
            .await
    }

    pub async fn chats(&self, query: DialogQuery) -> Result<Page<ChatSummary>> {
        self.call(|reply| Command::Chats { query, reply }).await
    }
}
