//! Message intake pipeline: dedup → filters → trigger → summarize → persist → reply.
//!
//! Steps after the trigger run in order and stop at the first failure. Nothing is
//! rolled back: a page written to the store stays even when the reply cannot be sent.

use crate::channels::{trigger, ChannelError, ChannelRegistry, InboundMessage, Platform};
use crate::dedup::DedupFilter;
use crate::llm::{SummarizeError, Summarizer};
use crate::store::{NotionError, SummaryStore};
use serde::Serialize;
use std::sync::Arc;

/// What happened to one inbound message; serialized as the webhook response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Duplicate,
    Ignored,
    Success,
    Error { error: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Summarize(#[from] SummarizeError),
    #[error(transparent)]
    Store(#[from] NotionError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("no channel registered for {0}")]
    NoChannel(Platform),
}

pub struct Relay {
    dedup: DedupFilter,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<dyn SummaryStore>,
    channels: Arc<ChannelRegistry>,
}

impl Relay {
    pub fn new(
        dedup: DedupFilter,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<dyn SummaryStore>,
        channels: Arc<ChannelRegistry>,
    ) -> Self {
        Self {
            dedup,
            summarizer,
            store,
            channels,
        }
    }

    /// Handle one message. The dedup key is recorded before any filtering so a
    /// redelivery is always answered `duplicate`, even for messages that were ignored.
    pub async fn handle(&self, msg: InboundMessage) -> Outcome {
        if !self.dedup.check_and_insert(msg.dedup_key()).await {
            log::debug!("{}: duplicate delivery of {} in {}", msg.platform.id(), msg.message_id, msg.conversation_id);
            return Outcome::Duplicate;
        }
        if !msg.is_text {
            return ignored(&msg, "non-text message");
        }
        if msg.sender_is_bot {
            return ignored(&msg, "bot sender");
        }
        if msg.text.trim().is_empty() {
            return ignored(&msg, "empty text");
        }
        let Some(body) = trigger::parse(msg.platform, &msg.text) else {
            return ignored(&msg, "no trigger keyword");
        };
        match self.run(&msg, &body).await {
            Ok(()) => Outcome::Success,
            Err(e) => {
                log::warn!("{}: relay failed for {}: {}", msg.platform.id(), msg.message_id, e);
                Outcome::Error {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn run(&self, msg: &InboundMessage, text: &str) -> Result<(), RelayError> {
        let summary = self.summarizer.summarize(text).await?;
        let saved = self.store.persist(text, &summary, msg.platform).await?;
        log::info!(
            "{}: stored summary (status {}, page {})",
            msg.platform.id(),
            saved.status,
            saved.page_id.as_deref().unwrap_or("-")
        );
        let channel = self
            .channels
            .get(msg.platform)
            .await
            .ok_or(RelayError::NoChannel(msg.platform))?;
        channel
            .send_message(&msg.conversation_id, &channel.format_summary(&summary))
            .await?;
        Ok(())
    }
}

fn ignored(msg: &InboundMessage, reason: &str) -> Outcome {
    log::debug!("{}: ignored {}: {}", msg.platform.id(), msg.message_id, reason);
    Outcome::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChannelHandle;
    use crate::store::PersistOutcome;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Calls {
        summarized: Mutex<Vec<String>>,
        persisted: Mutex<Vec<(String, String, Platform)>>,
        sent: Mutex<Vec<(String, String)>>,
    }

    struct FakeSummarizer {
        calls: Arc<Calls>,
        fail: bool,
    }

    #[async_trait]
    impl Summarizer for FakeSummarizer {
        async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
            self.calls.summarized.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(SummarizeError::Api { status: 503 });
            }
            Ok(format!("summary of {}", text))
        }
    }

    struct FakeStore {
        calls: Arc<Calls>,
    }

    #[async_trait]
    impl SummaryStore for FakeStore {
        async fn persist(
            &self,
            transcript: &str,
            summary: &str,
            platform: Platform,
        ) -> Result<PersistOutcome, NotionError> {
            self.calls
                .persisted
                .lock()
                .unwrap()
                .push((transcript.to_string(), summary.to_string(), platform));
            Ok(PersistOutcome {
                status: 200,
                page_id: Some("p1".to_string()),
            })
        }
    }

    struct FakeChannel {
        platform: Platform,
        calls: Arc<Calls>,
        fail: bool,
    }

    #[async_trait]
    impl ChannelHandle for FakeChannel {
        fn platform(&self) -> Platform {
            self.platform
        }

        fn format_summary(&self, summary: &str) -> String {
            format!("> {}", summary)
        }

        async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), ChannelError> {
            self.calls
                .sent
                .lock()
                .unwrap()
                .push((conversation_id.to_string(), text.to_string()));
            if self.fail {
                return Err(ChannelError::Api {
                    platform: self.platform,
                    detail: "channel_not_found".to_string(),
                });
            }
            Ok(())
        }
    }

    async fn relay(fail_summary: bool, fail_send: bool) -> (Relay, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let channels = Arc::new(ChannelRegistry::new());
        for platform in [Platform::Lark, Platform::Slack] {
            channels
                .register(Arc::new(FakeChannel {
                    platform,
                    calls: calls.clone(),
                    fail: fail_send,
                }))
                .await;
        }
        let relay = Relay::new(
            DedupFilter::new(Duration::from_secs(60), 100),
            Arc::new(FakeSummarizer {
                calls: calls.clone(),
                fail: fail_summary,
            }),
            Arc::new(FakeStore { calls: calls.clone() }),
            channels,
        );
        (relay, calls)
    }

    fn message(platform: Platform, id: &str, text: &str) -> InboundMessage {
        InboundMessage {
            platform,
            conversation_id: "c1".to_string(),
            message_id: id.to_string(),
            text: text.to_string(),
            is_text: true,
            sender_is_bot: false,
        }
    }

    fn downstream_calls(calls: &Calls) -> usize {
        calls.summarized.lock().unwrap().len()
            + calls.persisted.lock().unwrap().len()
            + calls.sent.lock().unwrap().len()
    }

    #[tokio::test]
    async fn triggered_message_runs_full_pipeline() {
        let (relay, calls) = relay(false, false).await;
        let outcome = relay
            .handle(message(Platform::Lark, "m1", "/summary Discuss Q3 roadmap"))
            .await;
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(*calls.summarized.lock().unwrap(), vec!["Discuss Q3 roadmap".to_string()]);
        assert_eq!(
            *calls.persisted.lock().unwrap(),
            vec![(
                "Discuss Q3 roadmap".to_string(),
                "summary of Discuss Q3 roadmap".to_string(),
                Platform::Lark
            )]
        );
        assert_eq!(
            *calls.sent.lock().unwrap(),
            vec![("c1".to_string(), "> summary of Discuss Q3 roadmap".to_string())]
        );
    }

    #[tokio::test]
    async fn redelivery_is_duplicate_without_downstream_calls() {
        let (relay, calls) = relay(false, false).await;
        let msg = message(Platform::Slack, "1.1", "!summary notes");
        assert_eq!(relay.handle(msg.clone()).await, Outcome::Success);
        let before = downstream_calls(&calls);
        assert_eq!(relay.handle(msg).await, Outcome::Duplicate);
        assert_eq!(downstream_calls(&calls), before);
    }

    #[tokio::test]
    async fn ignored_message_is_still_remembered() {
        let (relay, _) = relay(false, false).await;
        let msg = message(Platform::Lark, "m1", "just chatting");
        assert_eq!(relay.handle(msg.clone()).await, Outcome::Ignored);
        assert_eq!(relay.handle(msg).await, Outcome::Duplicate);
    }

    #[tokio::test]
    async fn filters_ignore_without_downstream_calls() {
        let (relay, calls) = relay(false, false).await;

        assert_eq!(relay.handle(message(Platform::Lark, "a", "no trigger here")).await, Outcome::Ignored);
        assert_eq!(relay.handle(message(Platform::Lark, "b", "   ")).await, Outcome::Ignored);

        let mut image = message(Platform::Lark, "c", "/summary x");
        image.is_text = false;
        assert_eq!(relay.handle(image).await, Outcome::Ignored);

        let mut bot = message(Platform::Slack, "d", "!summary x");
        bot.sender_is_bot = true;
        assert_eq!(relay.handle(bot).await, Outcome::Ignored);

        assert_eq!(downstream_calls(&calls), 0);
    }

    #[tokio::test]
    async fn bare_trigger_summarizes_empty_text() {
        let (relay, calls) = relay(false, false).await;
        assert_eq!(relay.handle(message(Platform::Lark, "m1", "/summary")).await, Outcome::Success);
        assert_eq!(*calls.summarized.lock().unwrap(), vec![String::new()]);
    }

    #[tokio::test]
    async fn summarizer_failure_stops_before_persist() {
        let (relay, calls) = relay(true, false).await;
        let outcome = relay.handle(message(Platform::Lark, "m1", "/summary notes")).await;
        assert_eq!(
            outcome,
            Outcome::Error {
                error: "Groq API error: 503".to_string()
            }
        );
        assert!(calls.persisted.lock().unwrap().is_empty());
        assert!(calls.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_failure_is_reported_after_persist() {
        let (relay, calls) = relay(false, true).await;
        let outcome = relay.handle(message(Platform::Slack, "1.2", "summary: notes")).await;
        let Outcome::Error { error } = outcome else {
            panic!("expected error outcome");
        };
        assert!(error.contains("channel_not_found"));
        assert_eq!(calls.persisted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_channel_is_an_error() {
        let calls = Arc::new(Calls::default());
        let relay = Relay::new(
            DedupFilter::new(Duration::from_secs(60), 100),
            Arc::new(FakeSummarizer {
                calls: calls.clone(),
                fail: false,
            }),
            Arc::new(FakeStore { calls: calls.clone() }),
            Arc::new(ChannelRegistry::new()),
        );
        let outcome = relay.handle(message(Platform::Slack, "1.3", "!summary x")).await;
        assert_eq!(
            outcome,
            Outcome::Error {
                error: "no channel registered for Slack".to_string()
            }
        );
    }

    #[test]
    fn outcome_serializes_as_status() {
        assert_eq!(
            serde_json::to_value(Outcome::Duplicate).unwrap(),
            serde_json::json!({ "status": "duplicate" })
        );
        assert_eq!(
            serde_json::to_value(Outcome::Error { error: "boom".to_string() }).unwrap(),
            serde_json::json!({ "status": "error", "error": "boom" })
        );
    }
}
