//! Telegram provider
//!
//! - `ChatProvider`: the seam the gateway drives
//! - `TelegramClient`: grammers-backed implementation over raw
//!   `messages.getDialogs` / `messages.getHistory` calls
//! - `generate_session`: interactive login that writes the session file

mod client;
mod login;
mod peer;
mod provider;
mod types;

pub use client::TelegramClient;
pub use login::{generate_session, LoginOutcome, LoginPrompt};
pub use peer::PeerRef;
pub use provider::ChatProvider;
pub use types::{
    format_date, ChatFilter, ChatMessage, ChatSummary, DialogQuery, MessagePreview, Page,
};
