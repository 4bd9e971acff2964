//! Groq client: one non-streaming POST /chat/completions per summary.

use crate::config::GroqConfig;
use crate::lang::{self, Language};
use crate::llm::{SummarizeError, Summarizer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Client for Groq's OpenAI-compatible API.
#[derive(Clone)]
pub struct GroqClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct CompletionMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

/// Instruction prompt in the language of the text: Vietnamese, Japanese, English for everything else.
pub fn build_prompt(language: Language, text: &str) -> String {
    match language {
        Language::Vietnamese => format!(
            "Tóm tắt ngắn gọn nội dung cuộc họp sau bằng tiếng Việt:\n\n{}",
            text
        ),
        Language::Japanese => format!("以下の会議内容を日本語で簡潔にまとめてください:\n\n{}", text),
        _ => format!("Summarize the following meeting notes in English:\n\n{}", text),
    }
}

impl GroqClient {
    /// `api_key` is the resolved key (env or config); sampling settings come from `config`.
    pub fn new(api_key: Option<String>, config: &GroqConfig) -> Self {
        let base_url = config
            .base_url
            .as_ref()
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| GROQ_BASE_URL.to_string());
        Self {
            base_url,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn map_send_error(&self, e: reqwest::Error) -> SummarizeError {
        if e.is_timeout() {
            SummarizeError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            SummarizeError::Request(e)
        }
    }
}

#[async_trait]
impl Summarizer for GroqClient {
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let api_key = self.api_key.as_ref().ok_or(SummarizeError::MissingApiKey)?;
        let language = lang::detect(text);
        log::debug!("groq: summarizing {} chars as {:?}", text.chars().count(), language);
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![CompletionMessage {
                role: "user".to_string(),
                content: build_prompt(language, text),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let url = format!("{}/chat/completions", self.base_url);
        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        if res.status() != reqwest::StatusCode::OK {
            return Err(SummarizeError::Api {
                status: res.status().as_u16(),
            });
        }
        let data: CompletionResponse = res.json().await.map_err(|e| self.map_send_error(e))?;
        data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or(SummarizeError::EmptyResponse)
    }
}
