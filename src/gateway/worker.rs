use crate::telegram::{ChatMessage, ChatProvider, ChatSummary, DialogQuery, MessagePreview, Page};
use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

/// Messages of one chat plus its separately fetched total
#[derive(Debug, Clone)]
pub struct ChatHistory {
    pub messages: Vec<ChatMessage>,
    pub total: usize,
}

/// A unit of provider work submitted by a request handler
pub(crate) enum Command {
    History {
        chat_id: i64,
        limit: usize,
        offset_id: i32,
        reply: oneshot::Sender<Result<ChatHistory>>,
    },
    MessageCount {
        chat_id: i64,
        reply: oneshot::Sender<Result<usize>>,
    },
    ChatCount {
        reply: oneshot::Sender<Result<usize>>,
    },
    FirstChatMessages {
        limit: usize,
        reply: oneshot::Sender<Result<Option<Vec<MessagePreview>>>>,
    },
    Chats {
        query: DialogQuery,
        reply: oneshot::Sender<Result<Page<ChatSummary>>>,
    },
    Shutdown {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Owns the provider and executes commands strictly one at a time
pub(crate) async fn run(mut provider: Box<dyn ChatProvider>, mut rx: mpsc::Receiver<Command>) {
    info!("Gateway worker started ({})", provider.name());

    let mut shutdown_reply = None;

    while let Some(command) = rx.recv().await {
        match command {
            Command::History {
                chat_id,
                limit,
                offset_id,
                reply,
            } => {
                debug!("history chat={} limit={} offset_id={}", chat_id, limit, offset_id);
                let result = history(provider.as_mut(), chat_id, limit, offset_id).await;
                let _ = reply.send(result);
            }
            Command::MessageCount { chat_id, reply } => {
                debug!("message count chat={}", chat_id);
                let result = message_count(provider.as_mut(), chat_id).await;
                let _ = reply.send(result);
            }
            Command::ChatCount { reply } => {
                debug!("chat count");
                let result = provider
                    .dialogs(&DialogQuery::count_only())
                    .await
                    .map(|page| page.total);
                let _ = reply.send(result);
            }
            Command::FirstChatMessages { limit, reply } => {
                debug!("first chat messages limit={}", limit);
                let result = first_chat_messages(provider.as_mut(), limit).await;
                let _ = reply.send(result);
            }
            Command::Chats { query, reply } => {
                debug!("chats {:?}", query);
                let result = provider.dialogs(&query).await;
                let _ = reply.send(result);
            }
            Command::Shutdown { reply } => {
                shutdown_reply = Some(reply);
                break;
            }
        }
    }

    // Also reached when every handle is dropped without an explicit shutdown
    let result = provider.disconnect().await;
    if let Err(e) = &result {
        error!("Failed to disconnect provider: {:#}", e);
    }
    if let Some(reply) = shutdown_reply {
        let _ = reply.send(result);
    }

    info!("Gateway worker stopped");
}

async fn message_count(provider: &mut dyn ChatProvider, chat_id: i64) -> Result<usize> {
    Ok(provider.messages(chat_id, 0, 0).await?.total)
}

async fn history(
    provider: &mut dyn ChatProvider,
    chat_id: i64,
    limit: usize,
    offset_id: i32,
) -> Result<ChatHistory> {
    let page = provider.messages(chat_id, limit, offset_id).await?;
    let total = message_count(provider, chat_id).await?;

    Ok(ChatHistory {
        messages: page.items,
        total,
    })
}

/// `None` when the account has no dialogs at all
async fn first_chat_messages(
    provider: &mut dyn ChatProvider,
    limit: usize,
) -> Result<Option<Vec<MessagePreview>>> {
    let query = DialogQuery {
        limit: 1,
        ..DialogQuery::default()
    };
    let first = match provider.dialogs(&query).await?.items.into_iter().next() {
        Some(chat) => chat,
        None => return Ok(None),
    };

    let page = provider.messages(first.id, limit, 0).await?;
    Ok(Some(page.items.into_iter().map(MessagePreview::from).collect()))
}
