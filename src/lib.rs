pub mod config;
pub mod gateway;
pub mod http;
pub mod telegram;

pub use config::{Config, Credentials};
pub use gateway::{ChatHistory, Gateway, GatewayHandle};
pub use http::{create_router, AppState};
pub use telegram::{
    ChatFilter, ChatMessage, ChatProvider, ChatSummary, DialogQuery, MessagePreview, Page,
    TelegramClient,
};
