use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// A page of provider results together with the provider-reported total
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// A conversation as listed for the account
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatSummary {
    /// Marked peer id (users positive, groups and channels negative)
    pub id: i64,

    /// Title for groups/channels, full name for users
    pub name: String,

    pub is_group: bool,

    pub is_channel: bool,

    /// Date of the dialog's top message, if it has one
    #[serde(serialize_with = "serialize_opt_date")]
    pub date: Option<DateTime<Utc>>,

    /// Debug rendering of the raw provider object
    pub whole_dialog: String,
}

/// A single message in a chat's history
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub id: i32,

    /// Marked id of the sender; the chat itself for anonymous channel posts
    pub sender_id: Option<i64>,

    /// Text body; `None` for service messages
    pub message: Option<String>,

    #[serde(serialize_with = "serialize_date")]
    pub date: DateTime<Utc>,

    /// Debug rendering of the raw provider object
    pub whole_msg: String,
}

/// Reduced message view returned by the first-chat endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessagePreview {
    #[serde(serialize_with = "serialize_date")]
    pub date: DateTime<Utc>,
    pub sender_id: Option<i64>,
    pub text: String,
}

impl From<ChatMessage> for MessagePreview {
    fn from(message: ChatMessage) -> Self {
        Self {
            date: message.date,
            sender_id: message.sender_id,
            text: message.message.unwrap_or_default(),
        }
    }
}

/// Parameters of a dialog listing request
#[derive(Debug, Clone, PartialEq)]
pub struct DialogQuery {
    /// Number of dialogs to return (0 only fetches the total)
    pub limit: usize,

    /// Only dialogs whose top message is older than this id
    pub offset_id: i32,

    /// Only dialogs whose top message is older than this date
    pub offset_date: Option<DateTime<Utc>>,

    /// Exclude pinned dialogs from the request
    pub ignore_pinned: bool,

    /// Drop basic groups that were upgraded to a supergroup
    pub ignore_migrated: bool,

    /// Peer folder id (0 = main list, 1 = archive)
    pub folder: Option<i32>,

    /// Shorthand for `folder`; takes precedence when set
    pub archived: Option<bool>,
}

impl Default for DialogQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            offset_id: 0,
            offset_date: None,
            ignore_pinned: false,
            ignore_migrated: false,
            folder: None,
            archived: None,
        }
    }
}

impl DialogQuery {
    /// Only fetch the total dialog count
    pub fn count_only() -> Self {
        Self {
            limit: 0,
            ..Self::default()
        }
    }

    /// Folder id sent to the provider
    pub fn folder_id(&self) -> Option<i32> {
        match self.archived {
            Some(true) => Some(1),
            Some(false) => Some(0),
            None => self.folder,
        }
    }
}

/// Client-side chat type filter applied after a page is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFilter {
    Group,
    Channel,
}

impl ChatFilter {
    /// Unknown values mean "no filter"
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "group" => Some(Self::Group),
            "channel" => Some(Self::Channel),
            _ => None,
        }
    }

    pub fn matches(self, chat: &ChatSummary) -> bool {
        match self {
            Self::Group => chat.is_group,
            Self::Channel => chat.is_channel,
        }
    }

    /// Keeps matching chats; never tops the page back up
    pub fn retain(filter: Option<Self>, chats: Vec<ChatSummary>) -> Vec<ChatSummary> {
        match filter {
            Some(filter) => chats.into_iter().filter(|c| filter.matches(c)).collect(),
            None => chats,
        }
    }
}

/// `2024-03-01 09:30:00+00:00`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

fn serialize_date<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_date(date))
}

fn serialize_opt_date<S: Serializer>(
    date: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.serialize_str(&format_date(date)),
        None => serializer.serialize_none(),
    }
}
