use super::peer::PeerRef;
use super::provider::ChatProvider;
use super::types::{ChatMessage, ChatSummary, DialogQuery, Page};
use crate::config::Credentials;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use grammers_client::{Client, Config as ClientConfig, InitParams};
use grammers_session::Session;
use grammers_tl_types as tl;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Largest page the provider serves per request
const MAX_BATCH: usize = 100;

/// What the gateway knows about a peer seen in any response
#[derive(Debug, Clone)]
struct Entity {
    name: String,
    is_group: bool,
    is_channel: bool,
    migrated: bool,
    input: tl::enums::InputPeer,
}

/// Authorized Telegram connection backed by a session file
pub struct TelegramClient {
    client: Client,
    session_path: PathBuf,
    /// Peers seen so far, keyed by marked id
    entities: HashMap<i64, Entity>,
}

impl TelegramClient {
    /// Connect using an existing session file
    ///
    /// Fails if the session has not been authorized by `generate-session`.
    pub async fn connect(credentials: &Credentials, session_path: impl AsRef<Path>) -> Result<Self> {
        let session_path = session_path.as_ref().to_path_buf();
        info!("Connecting to Telegram (session: {})", session_path.display());

        let session = Session::load_file(&session_path).with_context(|| {
            format!("Failed to load session file {}", session_path.display())
        })?;

        let client = Client::connect(ClientConfig {
            session,
            api_id: credentials.api_id,
            api_hash: credentials.api_hash.clone(),
            params: InitParams::default(),
        })
        .await
        .context("Failed to connect to Telegram")?;

        let authorized = client
            .is_authorized()
            .await
            .context("Failed to check session authorization")?;
        if !authorized {
            bail!(
                "Session {} is not authorized, run generate-session first",
                session_path.display()
            );
        }

        info!("Connected to Telegram successfully");

        Ok(Self {
            client,
            session_path,
            entities: HashMap::new(),
        })
    }

    fn remember(&mut self, users: &[tl::enums::User], chats: &[tl::enums::Chat]) {
        for user in users {
            let (peer, entity) = user_entity(user);
            self.entities.insert(peer.marked(), entity);
        }
        for chat in chats {
            let (peer, entity) = chat_entity(chat);
            self.entities.insert(peer.marked(), entity);
        }
    }

    /// Input peer for a marked id, scanning all dialogs on a cache miss
    async fn resolve(&mut self, chat_id: i64) -> Result<tl::enums::InputPeer> {
        if let Some(entity) = self.entities.get(&chat_id) {
            return Ok(entity.input.clone());
        }

        // Basic groups need no access hash
        if let PeerRef::Chat(id) = PeerRef::from_marked(chat_id) {
            return Ok(tl::enums::InputPeer::Chat(tl::types::InputPeerChat { chat_id: id }));
        }

        debug!("Peer {} not cached, scanning dialogs", chat_id);
        let scan = DialogQuery {
            limit: usize::MAX,
            ..DialogQuery::default()
        };
        self.fetch_dialogs(&scan).await?;

        match self.entities.get(&chat_id) {
            Some(entity) => Ok(entity.input.clone()),
            None => bail!("Could not find the input entity for chat {}", chat_id),
        }
    }

    async fn fetch_dialogs(&mut self, query: &DialogQuery) -> Result<Page<ChatSummary>> {
        let mut offset_date = match query.offset_date {
            Some(date) => i32::try_from(date.timestamp())
                .with_context(|| format!("offset_date {} is out of range", date))?,
            None => 0,
        };
        let mut offset_id = query.offset_id;
        let mut offset_peer = tl::enums::InputPeer::Empty;

        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut total;

        loop {
            let batch = query.limit.saturating_sub(items.len()).clamp(1, MAX_BATCH);
            let request = tl::functions::messages::GetDialogs {
                exclude_pinned: query.ignore_pinned,
                folder_id: query.folder_id(),
                offset_date,
                offset_id,
                offset_peer: offset_peer.clone(),
                limit: batch as i32,
                hash: 0,
            };

            let (dialogs, messages, chats, users, complete) = match self
                .client
                .invoke(&request)
                .await
                .context("Failed to fetch dialogs")?
            {
                tl::enums::messages::Dialogs::Dialogs(d) => {
                    total = seen.len() + d.dialogs.len();
                    (d.dialogs, d.messages, d.chats, d.users, true)
                }
                tl::enums::messages::Dialogs::Slice(d) => {
                    total = d.count as usize;
                    (d.dialogs, d.messages, d.chats, d.users, false)
                }
                tl::enums::messages::Dialogs::NotModified(d) => {
                    total = d.count as usize;
                    break;
                }
            };

            self.remember(&users, &chats);

            let dates: HashMap<(PeerRef, i32), i32> = messages
                .iter()
                .filter_map(|m| message_key(m).zip(message_timestamp(m)))
                .collect();

            let received = dialogs.len();
            let mut last = None;

            for dialog in dialogs {
                let dialog = match dialog {
                    tl::enums::Dialog::Dialog(d) => d,
                    tl::enums::Dialog::Folder(_) => continue,
                };

                let peer = PeerRef::from_peer(&dialog.peer);
                let date = dates.get(&(peer, dialog.top_message)).copied();
                last = Some((peer, dialog.top_message, date));

                if !seen.insert(peer) {
                    continue;
                }

                let entity = self.entities.get(&peer.marked());
                if query.ignore_migrated && entity.map_or(false, |e| e.migrated) {
                    continue;
                }

                if items.len() < query.limit {
                    items.push(ChatSummary {
                        id: peer.marked(),
                        name: entity.map(|e| e.name.clone()).unwrap_or_default(),
                        is_group: entity.map_or(false, |e| e.is_group),
                        is_channel: entity.map_or(false, |e| e.is_channel),
                        date: date.and_then(timestamp_to_utc),
                        whole_dialog: format!("{:?}", dialog),
                    });
                }
            }

            if complete || query.limit == 0 || items.len() >= query.limit || received < batch {
                break;
            }

            // Continue after the oldest dialog of this batch
            match last {
                Some((peer, top_message, date)) => {
                    offset_id = top_message;
                    offset_date = date.unwrap_or(0);
                    offset_peer = match self.entities.get(&peer.marked()) {
                        Some(entity) => entity.input.clone(),
                        None => break,
                    };
                }
                None => break,
            }
        }

        debug!("Fetched {} dialogs (total {})", items.len(), total);

        Ok(Page { items, total })
    }

    async fn fetch_history(
        &mut self,
        chat_id: i64,
        limit: usize,
        offset_id: i32,
    ) -> Result<Page<ChatMessage>> {
        let peer = self.resolve(chat_id).await?;

        let mut offset_id = offset_id;
        let mut items = Vec::new();
        let mut total;

        loop {
            let batch = limit.saturating_sub(items.len()).clamp(1, MAX_BATCH);
            let request = tl::functions::messages::GetHistory {
                peer: peer.clone(),
                offset_id,
                offset_date: 0,
                add_offset: 0,
                limit: batch as i32,
                max_id: 0,
                min_id: 0,
                hash: 0,
            };

            let (messages, chats, users, complete) = match self
                .client
                .invoke(&request)
                .await
                .with_context(|| format!("Failed to fetch messages for chat {}", chat_id))?
            {
                tl::enums::messages::Messages::Messages(m) => {
                    total = items.len() + m.messages.len();
                    (m.messages, m.chats, m.users, true)
                }
                tl::enums::messages::Messages::Slice(m) => {
                    total = m.count as usize;
                    (m.messages, m.chats, m.users, false)
                }
                tl::enums::messages::Messages::ChannelMessages(m) => {
                    total = m.count as usize;
                    (m.messages, m.chats, m.users, false)
                }
                tl::enums::messages::Messages::NotModified(m) => {
                    total = m.count as usize;
                    break;
                }
            };

            self.remember(&users, &chats);

            let received = messages.len();
            let mut last_id = None;

            for message in &messages {
                if let Some(converted) = chat_message(message) {
                    last_id = Some(converted.id);
                    if items.len() < limit {
                        items.push(converted);
                    }
                }
            }

            if complete || limit == 0 || items.len() >= limit || received < batch {
                break;
            }

            match last_id {
                Some(id) => offset_id = id,
                None => break,
            }
        }

        debug!("Fetched {} messages from chat {} (total {})", items.len(), chat_id, total);

        Ok(Page { items, total })
    }
}

#[async_trait::async_trait]
impl ChatProvider for TelegramClient {
    async fn dialogs(&mut self, query: &DialogQuery) -> Result<Page<ChatSummary>> {
        self.fetch_dialogs(query).await
    }

    async fn messages(
        &mut self,
        chat_id: i64,
        limit: usize,
        offset_id: i32,
    ) -> Result<Page<ChatMessage>> {
        self.fetch_history(chat_id, limit, offset_id).await
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!("Closing Telegram connection");
        self.client
            .session()
            .save_to_file(&self.session_path)
            .with_context(|| format!("Failed to save session to {}", self.session_path.display()))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

fn user_entity(user: &tl::enums::User) -> (PeerRef, Entity) {
    match user {
        tl::enums::User::User(u) => (
            PeerRef::User(u.id),
            Entity::new(
                display_name(u.first_name.as_deref(), u.last_name.as_deref()),
                false,
                false,
                false,
                user_input(u.id, u.access_hash.unwrap_or(0)),
            ),
        ),
        tl::enums::User::Empty(u) => (
            PeerRef::User(u.id),
            Entity::new(String::new(), false, false, false, user_input(u.id, 0)),
        ),
    }
}

fn chat_entity(chat: &tl::enums::Chat) -> (PeerRef, Entity) {
    match chat {
        tl::enums::Chat::Empty(c) => basic_group(c.id, String::new(), false),
        tl::enums::Chat::Chat(c) => basic_group(c.id, c.title.clone(), c.migrated_to.is_some()),
        tl::enums::Chat::Forbidden(c) => basic_group(c.id, c.title.clone(), false),
        tl::enums::Chat::Channel(c) => channel(
            c.id,
            c.access_hash.unwrap_or(0),
            c.title.clone(),
            c.megagroup,
        ),
        tl::enums::Chat::ChannelForbidden(c) => {
            channel(c.id, c.access_hash, c.title.clone(), c.megagroup)
        }
    }
}

/// First and last name joined, skipping missing or empty parts
fn display_name(first: Option<&str>, last: Option<&str>) -> String {
    [first, last]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn user_input(user_id: i64, access_hash: i64) -> tl::enums::InputPeer {
    tl::enums::InputPeer::User(tl::types::InputPeerUser {
        user_id,
        access_hash,
    })
}

fn basic_group(id: i64, title: String, migrated: bool) -> (PeerRef, Entity) {
    let input = tl::enums::InputPeer::Chat(tl::types::InputPeerChat { chat_id: id });
    (PeerRef::Chat(id), Entity::new(title, true, false, migrated, input))
}

/// Supergroups (megagroups) count as both group and channel
fn channel(id: i64, access_hash: i64, title: String, megagroup: bool) -> (PeerRef, Entity) {
    let input = tl::enums::InputPeer::Channel(tl::types::InputPeerChannel {
        channel_id: id,
        access_hash,
    });
    (PeerRef::Channel(id), Entity::new(title, megagroup, true, false, input))
}

impl Entity {
    fn new(
        name: String,
        is_group: bool,
        is_channel: bool,
        migrated: bool,
        input: tl::enums::InputPeer,
    ) -> Self {
        Self {
            name,
            is_group,
            is_channel,
            migrated,
            input,
        }
    }
}

fn message_key(message: &tl::enums::Message) -> Option<(PeerRef, i32)> {
    match message {
        tl::enums::Message::Message(m) => Some((PeerRef::from_peer(&m.peer_id), m.id)),
        tl::enums::Message::Service(m) => Some((PeerRef::from_peer(&m.peer_id), m.id)),
        tl::enums::Message::Empty(m) => m.peer_id.as_ref().map(|p| (PeerRef::from_peer(p), m.id)),
    }
}

fn message_timestamp(message: &tl::enums::Message) -> Option<i32> {
    match message {
        tl::enums::Message::Message(m) => Some(m.date),
        tl::enums::Message::Service(m) => Some(m.date),
        tl::enums::Message::Empty(_) => None,
    }
}

fn timestamp_to_utc(timestamp: i32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp as i64, 0)
}

/// Marked id of whoever sent a message
///
/// Without `from_id` the sender is only known for channel posts and for
/// incoming private messages, where it can only be the chat itself.
/// Anonymous group admins stay `None`.
fn sender_of(
    from_id: Option<&tl::enums::Peer>,
    peer_id: &tl::enums::Peer,
    post: bool,
    out: bool,
) -> Option<i64> {
    if let Some(from) = from_id {
        return Some(PeerRef::from_peer(from).marked());
    }

    let private = matches!(peer_id, tl::enums::Peer::User(_));
    if post || (private && !out) {
        Some(PeerRef::from_peer(peer_id).marked())
    } else {
        None
    }
}

fn chat_message(message: &tl::enums::Message) -> Option<ChatMessage> {
    match message {
        tl::enums::Message::Message(m) => Some(ChatMessage {
            id: m.id,
            sender_id: sender_of(m.from_id.as_ref(), &m.peer_id, m.post, m.out),
            message: Some(m.message.clone()),
            date: timestamp_to_utc(m.date).unwrap_or_default(),
            whole_msg: format!("{:?}", m),
        }),
        tl::enums::Message::Service(m) => Some(ChatMessage {
            id: m.id,
            sender_id: sender_of(m.from_id.as_ref(), &m.peer_id, m.post, m.out),
            message: None,
            date: timestamp_to_utc(m.date).unwrap_or_default(),
            whole_msg: format!("{:?}", m),
        }),
        tl::enums::Message::Empty(_) => None,
    }
}
