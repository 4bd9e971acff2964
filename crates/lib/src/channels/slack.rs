//! Slack channel: Events API callback parsing and chat.postMessage.

use crate::channels::inbound::{InboundMessage, Intake, Platform};
use crate::channels::registry::{ChannelError, ChannelHandle};
use async_trait::async_trait;
use serde::Deserialize;

pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Events API body POSTed to /slack/events.
#[derive(Debug, Default, Deserialize)]
pub struct SlackCallback {
    #[serde(rename = "type", default)]
    pub typ: Option<String>,
    #[serde(default)]
    pub challenge: Option<serde_json::Value>,
    #[serde(default)]
    pub event: Option<SlackMessageEvent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SlackMessageEvent {
    #[serde(rename = "type", default)]
    pub typ: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub channel: Option<String>,
    /// Message timestamp; unique per channel, used as the message id.
    pub ts: Option<String>,
    pub subtype: Option<String>,
    pub bot_id: Option<String>,
}

impl SlackMessageEvent {
    /// Bot posts (including our own replies) carry a bot_id or the bot_message subtype.
    pub fn is_bot_message(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }
}

impl SlackCallback {
    pub fn into_intake(self) -> Intake {
        match self.typ.as_deref() {
            Some("url_verification") => {
                return Intake::Challenge(self.challenge.unwrap_or(serde_json::Value::Null))
            }
            Some("event_callback") => {}
            _ => return Intake::Ignored("not an event callback"),
        }
        let Some(event) = self.event else {
            return Intake::Ignored("no event");
        };
        if event.typ.as_deref() != Some("message") {
            return Intake::Ignored("not a message event");
        }
        let sender_is_bot = event.is_bot_message();
        let (Some(channel), Some(ts)) = (event.channel, event.ts) else {
            return Intake::Ignored("missing channel or ts");
        };
        Intake::Message(InboundMessage {
            platform: Platform::Slack,
            conversation_id: channel,
            message_id: ts,
            text: event.text.unwrap_or_default(),
            is_text: true,
            sender_is_bot,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack connector: posts replies with a static bot token.
pub struct SlackChannel {
    api_base: String,
    bot_token: Option<String>,
    client: reqwest::Client,
}

impl SlackChannel {
    pub fn new(api_base: Option<String>, bot_token: Option<String>) -> Self {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| SLACK_API_BASE.to_string());
        Self {
            api_base,
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    /// POST /chat.postMessage: post a text message to a channel.
    pub async fn send_message(&self, channel: &str, text: &str) -> Result<(), ChannelError> {
        let token = self
            .bot_token
            .as_ref()
            .ok_or(ChannelError::NotConfigured(Platform::Slack))?;
        let url = format!("{}/chat.postMessage", self.api_base);
        let body = serde_json::json!({ "channel": channel, "text": text });
        let res = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChannelError::Api {
                platform: Platform::Slack,
                detail: format!("{} {}", status, body),
            });
        }
        let data: PostMessageResponse = res.json().await?;
        if !data.ok {
            return Err(ChannelError::Api {
                platform: Platform::Slack,
                detail: data.error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelHandle for SlackChannel {
    fn platform(&self) -> Platform {
        Platform::Slack
    }

    fn format_summary(&self, summary: &str) -> String {
        format!("📝 *Meeting Summary:*\n\n{}", summary)
    }

    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), ChannelError> {
        SlackChannel::send_message(self, conversation_id, text).await
    }
}
