use async_trait::async_trait;
use crate::application::errors::BotError;

/// Bot trait - the host handle every enabled plugin receives
#[async_trait]
pub trait Bot: Send + Sync {
    /// Send a message to a chat, returning the platform message id
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
