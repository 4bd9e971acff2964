//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.recap/config.json`) and environment.
//! Every credential can be supplied through the environment instead of the file; the
//! environment wins when both are set. A missing file is not an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Lark app credentials (tenant token exchange and message send).
    #[serde(default)]
    pub lark: LarkConfig,

    /// Slack bot settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Summarization backend (Groq, OpenAI-compatible completions).
    #[serde(default)]
    pub groq: GroqConfig,

    /// Notion database that receives one page per summary.
    #[serde(default)]
    pub notion: NotionConfig,

    /// Redelivery suppression window.
    #[serde(default)]
    pub dedup: DedupConfig,
}

/// Bind address and port for the webhook server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 8000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; chat platforms must be able to reach it).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LarkConfig {
    /// Overridden by LARK_APP_ID env when set.
    pub app_id: Option<String>,
    /// Overridden by LARK_APP_SECRET env when set.
    pub app_secret: Option<String>,
    /// Open API root (default https://open.larksuite.com/open-apis).
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackConfig {
    /// Bot token (xoxb-...). Overridden by SLACK_BOT_TOKEN env when set.
    pub bot_token: Option<String>,
    /// Web API root (default https://slack.com/api).
    pub api_base: Option<String>,
}

/// Completion request settings. Model, token cap and temperature are fixed per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroqConfig {
    /// Overridden by GROQ_API_KEY env when set.
    pub api_key: Option<String>,
    /// OpenAI-compatible base (default https://api.groq.com/openai/v1).
    pub base_url: Option<String>,
    #[serde(default = "default_groq_model")]
    pub model: String,
    #[serde(default = "default_groq_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_groq_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds (default 30).
    #[serde(default = "default_groq_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_groq_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_groq_max_tokens() -> u32 {
    500
}

fn default_groq_temperature() -> f32 {
    0.7
}

fn default_groq_timeout_secs() -> u64 {
    30
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_groq_model(),
            max_tokens: default_groq_max_tokens(),
            temperature: default_groq_temperature(),
            timeout_secs: default_groq_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotionConfig {
    /// Integration secret. Overridden by NOTION_API_KEY env when set.
    pub api_key: Option<String>,
    /// Target database id. Overridden by NOTION_DATABASE_ID env when set.
    pub database_id: Option<String>,
    /// API root (default https://api.notion.com/v1).
    pub api_base: Option<String>,
    /// Value of the Notion-Version header.
    #[serde(default = "default_notion_version")]
    pub notion_version: String,
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            database_id: None,
            api_base: None,
            notion_version: default_notion_version(),
        }
    }
}

/// How long a delivered message id is remembered, and how many are kept at most.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupConfig {
    #[serde(default = "default_dedup_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_dedup_capacity")]
    pub capacity: usize,
}

fn default_dedup_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_dedup_capacity() -> usize {
    10_000
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_dedup_ttl_secs(),
            capacity: default_dedup_capacity(),
        }
    }
}

/// Prefer a non-empty env value, then a non-empty configured value. Both are trimmed.
fn pick(env_value: Option<String>, configured: Option<&String>) -> Option<String> {
    env_value
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            configured
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

fn resolve_secret(var: &str, configured: Option<&String>) -> Option<String> {
    pick(std::env::var(var).ok(), configured)
}

/// Resolve the Lark app id: env LARK_APP_ID overrides config.
pub fn resolve_lark_app_id(config: &Config) -> Option<String> {
    resolve_secret("LARK_APP_ID", config.lark.app_id.as_ref())
}

/// Resolve the Lark app secret: env LARK_APP_SECRET overrides config.
pub fn resolve_lark_app_secret(config: &Config) -> Option<String> {
    resolve_secret("LARK_APP_SECRET", config.lark.app_secret.as_ref())
}

/// Resolve the Slack bot token: env SLACK_BOT_TOKEN overrides config.
pub fn resolve_slack_bot_token(config: &Config) -> Option<String> {
    resolve_secret("SLACK_BOT_TOKEN", config.slack.bot_token.as_ref())
}

/// Resolve the Groq API key: env GROQ_API_KEY overrides config.
pub fn resolve_groq_api_key(config: &Config) -> Option<String> {
    resolve_secret("GROQ_API_KEY", config.groq.api_key.as_ref())
}

/// Resolve the Notion integration secret: env NOTION_API_KEY overrides config.
pub fn resolve_notion_api_key(config: &Config) -> Option<String> {
    resolve_secret("NOTION_API_KEY", config.notion.api_key.as_ref())
}

/// Resolve the Notion database id: env NOTION_DATABASE_ID overrides config.
pub fn resolve_notion_database_id(config: &Config) -> Option<String> {
    resolve_secret("NOTION_DATABASE_ID", config.notion.database_id.as_ref())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("RECAP_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".recap").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or RECAP_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = read_config(&path)?;
    Ok((config, path))
}

fn read_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        return Ok(Config::default());
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing config from {}", path.display()))
}
