//! Lark channel: event callback parsing and message send via the Open API.

use crate::channels::inbound::{InboundMessage, Intake, Platform};
use crate::channels::registry::{ChannelError, ChannelHandle};
use crate::channels::token::TenantTokenProvider;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

pub const LARK_API_BASE: &str = "https://open.larksuite.com/open-apis";

/// Event callback body POSTed to /webhook (URL verification or `im.message.receive_v1`).
#[derive(Debug, Default, Deserialize)]
pub struct LarkCallback {
    /// `Some` whenever the key is present, even as `null`.
    #[serde(default, deserialize_with = "present")]
    pub challenge: Option<serde_json::Value>,
    #[serde(default)]
    pub event: Option<LarkEvent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LarkEvent {
    #[serde(default)]
    pub message: Option<LarkMessage>,
    #[serde(default)]
    pub sender: Option<LarkSender>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LarkMessage {
    pub chat_id: Option<String>,
    pub message_id: Option<String>,
    pub message_type: Option<String>,
    /// JSON-encoded string, e.g. `{"text":"/summary ..."}` for text messages.
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LarkSender {
    /// "user" or "app".
    pub sender_type: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl LarkCallback {
    pub fn into_intake(self) -> Intake {
        if let Some(challenge) = self.challenge {
            return Intake::Challenge(challenge);
        }
        let Some(event) = self.event else {
            return Intake::Ignored("no event");
        };
        let Some(message) = event.message else {
            return Intake::Ignored("no message");
        };
        let (Some(chat_id), Some(message_id)) = (message.chat_id, message.message_id) else {
            return Intake::Ignored("missing chat_id or message_id");
        };
        let sender_is_bot = event
            .sender
            .and_then(|s| s.sender_type)
            .is_some_and(|t| t == "app");
        Intake::Message(InboundMessage {
            platform: Platform::Lark,
            conversation_id: chat_id,
            message_id,
            text: message_text(message.content.as_deref()),
            is_text: message.message_type.as_deref() == Some("text"),
            sender_is_bot,
        })
    }
}

/// Text of a message `content` field; content that is not JSON is taken verbatim.
fn message_text(content: Option<&str>) -> String {
    let Some(content) = content else {
        return String::new();
    };
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(v) => v
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string(),
        Err(_) => content.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

/// Lark connector: sends replies into chats as the app, using the shared tenant token.
pub struct LarkChannel {
    api_base: String,
    tokens: Arc<TenantTokenProvider>,
    client: reqwest::Client,
}

impl LarkChannel {
    pub fn new(api_base: Option<String>, tokens: Arc<TenantTokenProvider>) -> Self {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| LARK_API_BASE.to_string());
        Self {
            api_base,
            tokens,
            client: reqwest::Client::new(),
        }
    }

    /// POST /im/v1/messages?receive_id_type=chat_id: send a text message to a chat.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        let token = self.tokens.token().await?;
        let url = format!("{}/im/v1/messages", self.api_base);
        let body = serde_json::json!({
            "receive_id": chat_id,
            "msg_type": "text",
            "content": serde_json::json!({ "text": text }).to_string(),
        });
        let res = self
            .client
            .post(&url)
            .bearer_auth(token)
            .query(&[("receive_id_type", "chat_id")])
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChannelError::Api {
                platform: Platform::Lark,
                detail: format!("{} {}", status, body),
            });
        }
        let data: SendResponse = res.json().await?;
        if data.code != 0 {
            return Err(ChannelError::Api {
                platform: Platform::Lark,
                detail: format!("code {}: {}", data.code, data.msg),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelHandle for LarkChannel {
    fn platform(&self) -> Platform {
        Platform::Lark
    }

    fn format_summary(&self, summary: &str) -> String {
        format!("📝 Tóm tắt cuộc họp:\n\n{}", summary)
    }

    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), ChannelError> {
        LarkChannel::send_message(self, conversation_id, text).await
    }
}
