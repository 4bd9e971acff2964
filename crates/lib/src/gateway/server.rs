//! Gateway HTTP server: Lark and Slack webhooks plus a health probe on one port.

use crate::channels::{
    ChannelRegistry, Intake, LarkCallback, LarkChannel, SlackCallback, SlackChannel,
    TenantTokenProvider, LARK_API_BASE,
};
use crate::config::{self, Config};
use crate::dedup::DedupFilter;
use crate::gateway::protocol::{HealthReport, PlatformFlags, WebhookReply};
use crate::llm::GroqClient;
use crate::relay::{Outcome, Relay};
use crate::store::NotionClient;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Shared state for the gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub relay: Arc<Relay>,
    /// Reported by /health; fixed at startup.
    pub platforms: PlatformFlags,
}

impl GatewayState {
    pub fn new(relay: Arc<Relay>, platforms: PlatformFlags) -> Self {
        Self { relay, platforms }
    }

    /// Build the production relay from config: Groq summarizer, Notion store, Lark and Slack channels.
    /// Missing credentials do not fail startup; the affected step fails per request instead.
    pub async fn from_config(config: &Config) -> Self {
        let lark_app_id = config::resolve_lark_app_id(config);
        let lark_app_secret = config::resolve_lark_app_secret(config);
        let slack_token = config::resolve_slack_bot_token(config);
        let lark_base = config
            .lark
            .api_base
            .clone()
            .unwrap_or_else(|| LARK_API_BASE.to_string());
        let tokens = Arc::new(TenantTokenProvider::new(
            lark_base.clone(),
            lark_app_id,
            lark_app_secret,
        ));
        let platforms = PlatformFlags {
            lark: tokens.has_credentials(),
            slack: slack_token.is_some(),
        };
        let channels = Arc::new(ChannelRegistry::new());
        channels
            .register(Arc::new(LarkChannel::new(Some(lark_base), tokens)))
            .await;
        channels
            .register(Arc::new(SlackChannel::new(
                config.slack.api_base.clone(),
                slack_token,
            )))
            .await;
        log::debug!("channels registered: {:?}", channels.platforms().await);

        let groq_key = config::resolve_groq_api_key(config);
        if groq_key.is_none() {
            log::warn!("GROQ_API_KEY not set; summaries will fail until it is configured");
        }
        let notion_key = config::resolve_notion_api_key(config);
        let notion_db = config::resolve_notion_database_id(config);
        if notion_key.is_none() || notion_db.is_none() {
            log::warn!("NOTION_API_KEY or NOTION_DATABASE_ID not set; summaries cannot be stored");
        }

        let relay = Relay::new(
            DedupFilter::new(Duration::from_secs(config.dedup.ttl_secs), config.dedup.capacity),
            Arc::new(GroqClient::new(groq_key, &config.groq)),
            Arc::new(NotionClient::new(notion_key, notion_db, &config.notion)),
            channels,
        );
        Self::new(Arc::new(relay), platforms)
    }
}

/// Routes: POST /webhook (Lark), POST /slack/events (Slack), GET /health.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/webhook", post(lark_webhook))
        .route("/slack/events", post(slack_webhook))
        .route("/health", get(health_http))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let state = GatewayState::from_config(&config).await;
    log::info!(
        "platforms configured: lark={} slack={}",
        state.platforms.lark,
        state.platforms.slack
    );
    let app = router(state);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
/// In-flight webhook requests are allowed to finish.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining requests");
}

/// Parse a callback body; malformed JSON is ignored rather than rejected so the platform does not retry it.
fn parse_callback<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_else(|e| {
        log::debug!("webhook: unparseable body: {}", e);
        T::default()
    })
}

async fn dispatch(state: &GatewayState, intake: Intake) -> WebhookReply {
    match intake {
        Intake::Challenge(challenge) => WebhookReply::Challenge { challenge },
        Intake::Ignored(reason) => {
            log::debug!("webhook: ignored: {}", reason);
            Outcome::Ignored.into()
        }
        Intake::Message(msg) => state.relay.handle(msg).await.into(),
    }
}

/// POST /webhook: Lark event callback.
async fn lark_webhook(State(state): State<GatewayState>, body: Bytes) -> Json<WebhookReply> {
    let callback: LarkCallback = parse_callback(&body);
    Json(dispatch(&state, callback.into_intake()).await)
}

/// POST /slack/events: Slack Events API callback.
async fn slack_webhook(State(state): State<GatewayState>, body: Bytes) -> Json<WebhookReply> {
    let callback: SlackCallback = parse_callback(&body);
    Json(dispatch(&state, callback.into_intake()).await)
}

/// GET /health: liveness plus which platforms can reply.
async fn health_http(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport::healthy(state.platforms))
}
