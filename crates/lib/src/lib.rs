//! Recap core library: webhook gateway, chat channels, summarizer, Notion store,
//! and the relay pipeline that connects them. Used by the `recap` CLI.

pub mod channels;
pub mod config;
pub mod dedup;
pub mod gateway;
pub mod init;
pub mod lang;
pub mod llm;
pub mod relay;
pub mod store;
