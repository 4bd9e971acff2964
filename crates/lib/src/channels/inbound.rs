//! Inbound message from a chat platform webhook, normalized for the relay pipeline.

use crate::dedup::DedupKey;
use std::fmt;

/// Chat platform a message arrived from (and the reply goes back to).
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Platform {
    Lark,
    Slack,
}

impl Platform {
    /// Lowercase id (e.g. "lark").
    pub fn id(self) -> &'static str {
        match self {
            Platform::Lark => "lark",
            Platform::Slack => "slack",
        }
    }

    /// Name used in stored page titles (e.g. "Lark").
    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Lark => "Lark",
            Platform::Slack => "Slack",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A chat message to be considered for summarization. Built per request, dropped after handling.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub platform: Platform,
    pub conversation_id: String,
    pub message_id: String,
    pub text: String,
    /// False for images, files, stickers, etc.
    pub is_text: bool,
    /// Bot and app senders are ignored so the relay never answers its own replies.
    pub sender_is_bot: bool,
}

impl InboundMessage {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            message_id: self.message_id.clone(),
            conversation_id: self.conversation_id.clone(),
            platform: self.platform,
        }
    }
}

/// What a webhook body turned out to be.
#[derive(Debug, Clone)]
pub enum Intake {
    /// URL verification handshake; the value is echoed back untouched.
    Challenge(serde_json::Value),
    Message(InboundMessage),
    /// Not a message the relay handles; the reason is for logs only.
    Ignored(&'static str),
}
