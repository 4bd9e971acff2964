//! Summarization backend.
//!
//! [`Summarizer`] is the seam the relay calls; [`GroqClient`] implements it against an
//! OpenAI-compatible chat completions endpoint.

mod groq;

pub use groq::{build_prompt, GroqClient, GROQ_BASE_URL};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("Missing GROQ_API_KEY")]
    MissingApiKey,
    #[error("Groq API error: {status}")]
    Api { status: u16 },
    #[error("Groq API timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("Groq request failed: {0}")]
    Request(reqwest::Error),
    #[error("Groq returned no choices")]
    EmptyResponse,
}

/// Turns raw meeting text into a short summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError>;
}
