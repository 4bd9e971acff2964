//! Lark tenant access token: exchanged from app id/secret and cached until shortly before expiry.

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Refresh this many seconds before the server-reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 300;
/// Assumed lifetime when the response omits `expire`.
const DEFAULT_EXPIRE_SECS: i64 = 7200;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("lark app id/secret not configured")]
    MissingCredentials,
    #[error("tenant token request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("tenant token rejected (code {code}): {msg}")]
    Rejected { code: i64, msg: String },
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    tenant_access_token: Option<String>,
    expire: Option<i64>,
}

/// Single-tenant token provider shared by everything that calls the Lark Open API.
pub struct TenantTokenProvider {
    api_base: String,
    app_id: Option<String>,
    app_secret: Option<String>,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TenantTokenProvider {
    pub fn new(api_base: impl Into<String>, app_id: Option<String>, app_secret: Option<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            app_id,
            app_secret,
            client: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.app_id.is_some() && self.app_secret.is_some()
    }

    /// Current token; refreshes when missing or expired. The lock is held across the
    /// refresh so concurrent callers wait for one exchange instead of racing.
    pub async fn token(&self) -> Result<String, TokenError> {
        let mut cached = self.cached.lock().await;
        let now = chrono::Utc::now().timestamp();
        if let Some(ref t) = *cached {
            if now < t.expires_at {
                return Ok(t.value.clone());
            }
        }
        let fresh = self.fetch(now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// POST /auth/v3/tenant_access_token/internal.
    async fn fetch(&self, now: i64) -> Result<CachedToken, TokenError> {
        let (Some(app_id), Some(app_secret)) = (self.app_id.as_deref(), self.app_secret.as_deref())
        else {
            return Err(TokenError::MissingCredentials);
        };
        let url = format!("{}/auth/v3/tenant_access_token/internal", self.api_base);
        log::debug!("lark: refreshing tenant access token");
        let res: TokenResponse = self
            .client
            .post(&url)
            .json(&TokenRequest { app_id, app_secret })
            .send()
            .await?
            .json()
            .await?;
        match res.tenant_access_token {
            Some(value) if res.code == 0 => {
                let expire = res.expire.unwrap_or(DEFAULT_EXPIRE_SECS);
                Ok(CachedToken {
                    value,
                    expires_at: now.saturating_add(expire).saturating_sub(EXPIRY_MARGIN_SECS),
                })
            }
            _ => Err(TokenError::Rejected {
                code: res.code,
                msg: res.msg,
            }),
        }
    }
}
