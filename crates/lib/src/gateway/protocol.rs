//! Gateway HTTP response bodies.

use crate::relay::Outcome;
use serde::Serialize;

/// Body returned to a webhook POST: the handshake echo, or the pipeline outcome
/// (`{"status": "duplicate" | "ignored" | "success" | "error", "error"?: ...}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WebhookReply {
    Challenge { challenge: serde_json::Value },
    Outcome(Outcome),
}

impl From<Outcome> for WebhookReply {
    fn from(outcome: Outcome) -> Self {
        WebhookReply::Outcome(outcome)
    }
}

/// Which platforms have the credentials they need to reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlatformFlags {
    pub lark: bool,
    pub slack: bool,
}

/// GET /health body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub platforms: PlatformFlags,
}

impl HealthReport {
    pub fn healthy(platforms: PlatformFlags) -> Self {
        Self {
            status: "healthy",
            platforms,
        }
    }
}
