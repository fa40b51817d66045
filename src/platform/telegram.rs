use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, warn};

use crate::config::TelegramConfig;
use crate::platform::{MarkupMode, OutboundReply, ReplySender};

/// Telegram rejects messages over 4096 characters; stay below that.
const MAX_MESSAGE_CHARS: usize = 4000;

/// Cut `text` to at most `max_chars` characters, ending at the last full
/// line when there is one, so Markdown spans are not split.
fn truncate_message(text: &str, max_chars: usize) -> &str {
    let Some((end, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };

    let head = &text[..end];
    match head.rfind('\n') {
        Some(pos) => &text[..pos],
        None => head,
    }
}

/// Sends replies through the Telegram Bot API
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let mut bot = Bot::new(&config.bot_token);
        if let Some(api_url) = &config.api_url {
            let url = reqwest::Url::parse(api_url)
                .with_context(|| format!("Invalid telegram.api_url: {}", api_url))?;
            bot = bot.set_api_url(url);
        }
        Ok(Self { bot })
    }
}

#[allow(deprecated)]
fn parse_mode(mode: MarkupMode) -> ParseMode {
    match mode {
        MarkupMode::Markdown => ParseMode::Markdown,
    }
}

#[async_trait]
impl ReplySender for TelegramSender {
    async fn send(&self, reply: &OutboundReply) -> Result<()> {
        let text = truncate_message(&reply.text, MAX_MESSAGE_CHARS);
        if text.len() < reply.text.len() {
            warn!(
                "Reply to chat {} truncated from {} to {} bytes",
                reply.chat_id,
                reply.text.len(),
                text.len()
            );
        }
        debug!("Sending {} bytes to chat {}", text.len(), reply.chat_id);

        self.bot
            .send_message(ChatId(reply.chat_id), text.to_string())
            .parse_mode(parse_mode(reply.mode))
            .await
            .with_context(|| format!("Failed to send message to chat {}", reply.chat_id))?;

        Ok(())
    }
}
