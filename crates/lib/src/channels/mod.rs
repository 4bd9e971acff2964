//! Chat platforms (Lark, Slack).
//!
//! Each platform has a callback payload parser that turns a webhook body into an
//! [`Intake`], and a [`ChannelHandle`] that posts replies back. Handles live in a
//! [`ChannelRegistry`] keyed by [`Platform`].

mod inbound;
mod lark;
mod registry;
mod slack;
mod token;
pub mod trigger;

pub use inbound::{InboundMessage, Intake, Platform};
pub use lark::{LarkCallback, LarkChannel, LARK_API_BASE};
pub use registry::{ChannelError, ChannelHandle, ChannelRegistry};
pub use slack::{SlackCallback, SlackChannel, SLACK_API_BASE};
pub use token::{TenantTokenProvider, TokenError};
