//! Summary persistence.
//!
//! [`SummaryStore`] is the seam the relay calls; [`NotionClient`] writes one database
//! page per summary.

mod notion;

pub use notion::{build_title, truncate, NotionClient, NOTION_API_BASE, MAX_FIELD_CHARS};

use crate::channels::Platform;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("notion api key or database id not configured")]
    MissingCredentials,
    #[error("notion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("notion api error: {status} {body}")]
    Api { status: u16, body: String },
}

/// Result of a successful write, as reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    pub status: u16,
    pub page_id: Option<String>,
}

/// Records a transcript and its summary.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn persist(
        &self,
        transcript: &str,
        summary: &str,
        platform: Platform,
    ) -> Result<PersistOutcome, NotionError>;
}
