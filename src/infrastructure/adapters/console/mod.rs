//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::sync::mpsc;
use crate::domain::traits::{Bot, BotInfo};
use crate::application::errors::BotError;

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    sender: Option<mpsc::Sender<String>>,
}

impl ConsoleAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: name.into(),
                username: "console".to_string(),
            },
            sender: None,
        }
    }

    /// Forward outgoing messages to a channel instead of stdout
    pub fn with_sender(mut self, sender: mpsc::Sender<String>) -> Self {
        self.sender = Some(sender);
        self
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new("carik-bot")
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        match &self.sender {
            Some(sender) => sender
                .send(format!("[{}] {}", chat_id, text))
                .await
                .map_err(|e| BotError::Send(e.to_string()))?,
            None => println!("[BOT] {}", text),
        }
        Ok("console_msg".to_string())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
