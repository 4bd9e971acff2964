//! Gateway: HTTP webhook endpoints for chat platforms.
//!
//! One port serves the Lark callback (`/webhook`), the Slack Events API callback
//! (`/slack/events`) and a health probe (`/health`). Each webhook body is parsed into
//! an intake and handed to the relay; the response body reports the outcome.

mod protocol;
mod server;

pub use protocol::{HealthReport, PlatformFlags, WebhookReply};
pub use server::{router, run_gateway, GatewayState};
