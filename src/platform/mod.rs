pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// Formatting applied to reply text by the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkupMode {
    /// Telegram's legacy Markdown: `*bold*`, `_italic_`, `` `code` ``
    #[default]
    Markdown,
}

/// A message to be sent back to a chat
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundReply {
    pub chat_id: i64,
    pub text: String,
    pub mode: MarkupMode,
}

impl OutboundReply {
    pub fn markdown(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            mode: MarkupMode::Markdown,
        }
    }
}

/// Delivers replies to the messaging platform.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, reply: &OutboundReply) -> Result<()>;
}
