use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::command::{Command, InboundMessage};
use crate::menu::MenuClient;
use crate::platform::{OutboundReply, ReplySender};

pub const WELCOME_TEXT: &str = "Welcome!\n\
     Use command: `/menu <business_id>`\n\
     Example: `/menu 5uUs2b4bQdS3WS8z16LJKw`";

pub const WRONG_FORMAT_TEXT: &str = "Wrong format.\n\
     Use: `/menu <business_id>`\n\
     Example: `/menu 5uUs2b4bQdS3WS8z16LJKw`";

/// Acknowledgment returned to the webhook caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerStatus {
    Ok,
    NoValidMessage,
}

impl HandlerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerStatus::Ok => "OK",
            HandlerStatus::NoValidMessage => "No valid message received.",
        }
    }
}

/// JSON body of the webhook response.
#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
}

impl From<HandlerStatus> for StatusBody {
    fn from(status: HandlerStatus) -> Self {
        Self {
            status: status.as_str(),
        }
    }
}

/// Dispatches chat commands from webhook updates.
pub struct CommandHandler {
    sender: Arc<dyn ReplySender>,
    menus: MenuClient,
}

impl CommandHandler {
    pub fn new(sender: Arc<dyn ReplySender>, menus: MenuClient) -> Self {
        Self { sender, menus }
    }

    /// Handle one webhook update. Sends at most one reply and always returns
    /// an acknowledgment, whatever the payload looks like.
    pub async fn handle(&self, payload: &Value) -> HandlerStatus {
        let Some(message) = InboundMessage::from_payload(payload) else {
            debug!("Ignoring update without chat id or text");
            return HandlerStatus::NoValidMessage;
        };

        info!("Message from chat {}: {}", message.chat_id, message.text);

        let text = match Command::parse(&message.text) {
            Command::Start => WELCOME_TEXT.to_string(),
            Command::MenuQuery(Some(business_id)) => {
                self.menus.fetch_menu_text(&business_id).await
            }
            Command::MenuQuery(None) => WRONG_FORMAT_TEXT.to_string(),
            Command::Unknown => {
                debug!("No command matched for chat {}", message.chat_id);
                return HandlerStatus::Ok;
            }
        };

        let reply = OutboundReply::markdown(message.chat_id, text);
        if let Err(e) = self.sender.send(&reply).await {
            error!("Failed to deliver reply to chat {}: {:#}", reply.chat_id, e);
        }

        HandlerStatus::Ok
    }
}
