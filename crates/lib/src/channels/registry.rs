//! Channel registry: outbound handles keyed by platform.

use crate::channels::token::TokenError;
use crate::channels::Platform;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("{0} is not configured")]
    NotConfigured(Platform),
    #[error("lark tenant token unavailable: {0}")]
    Token(#[from] TokenError),
    #[error("channel request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{platform} api error: {detail}")]
    Api { platform: Platform, detail: String },
}

/// Handle that posts messages back into a platform's conversations.
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    fn platform(&self) -> Platform;

    /// Wrap a summary in this platform's reply template.
    fn format_summary(&self, summary: &str) -> String;

    /// Send a text message to a conversation (Lark chat_id, Slack channel id).
    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), ChannelError>;
}

/// Registry of platform to handle. Shared across the gateway.
pub struct ChannelRegistry {
    inner: Arc<RwLock<HashMap<Platform, Arc<dyn ChannelHandle>>>>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register the handle under its own platform, replacing any previous one.
    pub async fn register(&self, handle: Arc<dyn ChannelHandle>) {
        let mut g = self.inner.write().await;
        g.insert(handle.platform(), handle);
    }

    pub async fn get(&self, platform: Platform) -> Option<Arc<dyn ChannelHandle>> {
        let g = self.inner.read().await;
        g.get(&platform).cloned()
    }

    pub async fn platforms(&self) -> Vec<Platform> {
        let g = self.inner.read().await;
        g.keys().copied().collect()
    }
}
