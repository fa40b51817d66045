use serde_json::Value;

/// A chat message pulled out of a webhook payload.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub text: String,
}

impl InboundMessage {
    /// Extract `message.chat.id` and `message.text` from a raw update.
    ///
    /// Returns `None` when the chat id is missing or the text is empty.
    /// A missing or mistyped field at any level counts as absent.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let message = payload.get("message");

        let chat_id = message
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"))
            .and_then(chat_id_from_value)?;

        let text = message
            .and_then(|m| m.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        if text.is_empty() {
            return None;
        }

        Some(Self {
            chat_id,
            text: text.to_string(),
        })
    }
}

fn chat_id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    /// `/menu <business_id>`; the id is `None` when the argument is missing
    MenuQuery(Option<String>),
    Unknown,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        if text == "/start" {
            return Command::Start;
        }

        if text.starts_with("/menu") {
            // Single-space split: "/menu  id" yields an empty token, which
            // counts as a missing argument.
            let business_id = text
                .split(' ')
                .nth(1)
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            return Command::MenuQuery(business_id);
        }

        Command::Unknown
    }
}
