//! Notion client: pages in a meeting-summary database.
//!
//! The database must have a title property "Meeting Title" and rich text properties
//! "Full Transcript" and "Summary". Rich text values are capped below Notion's 2000
//! character limit.

use crate::channels::Platform;
use crate::config::NotionConfig;
use crate::lang::{self, Language};
use crate::store::{NotionError, PersistOutcome, SummaryStore};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";

/// Longest transcript or summary sent, in characters, before the "..." marker.
pub const MAX_FIELD_CHARS: usize = 1900;

const ELLIPSIS: &str = "...";

/// Cut `text` to `max_chars` characters and append "..." when it was longer.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}{}", &text[..end], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Page title with the platform and a date localized for `language`.
pub fn build_title(platform: Platform, language: Language, date: NaiveDate) -> String {
    let (y, m, d) = (date.year(), date.month(), date.day());
    match language {
        Language::Vietnamese => format!("[{}] Tóm tắt cuộc họp - {:02}/{:02}/{}", platform, d, m, y),
        Language::Japanese => format!("[{}] 会議の要約 - {}年{:02}月{:02}日", platform, y, m, d),
        Language::Korean => format!("[{}] 회의 요약 - {}년 {:02}월 {:02}일", platform, y, m, d),
        Language::Chinese => format!("[{}] 会议摘要 - {}年{:02}月{:02}日", platform, y, m, d),
        Language::English | Language::Other => {
            format!("[{}] Meeting Summary - {}", platform, date.format("%b %d, %Y"))
        }
    }
}

fn page_properties(title: &str, transcript: &str, summary: &str) -> serde_json::Value {
    serde_json::json!({
        "Meeting Title": { "title": [{ "text": { "content": title } }] },
        "Full Transcript": { "rich_text": [{ "text": { "content": truncate(transcript, MAX_FIELD_CHARS) } }] },
        "Summary": { "rich_text": [{ "text": { "content": truncate(summary, MAX_FIELD_CHARS) } }] },
    })
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    id: Option<String>,
}

/// Client for the Notion REST API, bound to one database.
#[derive(Clone)]
pub struct NotionClient {
    api_base: String,
    api_key: Option<String>,
    database_id: Option<String>,
    notion_version: String,
    client: reqwest::Client,
}

impl NotionClient {
    /// `api_key` and `database_id` are the resolved values (env or config).
    pub fn new(api_key: Option<String>, database_id: Option<String>, config: &NotionConfig) -> Self {
        let api_base = config
            .api_base
            .as_ref()
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| NOTION_API_BASE.to_string());
        Self {
            api_base,
            api_key,
            database_id,
            notion_version: config.notion_version.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn credentials(&self) -> Result<(&str, &str), NotionError> {
        match (self.api_key.as_deref(), self.database_id.as_deref()) {
            (Some(key), Some(db)) => Ok((key, db)),
            _ => Err(NotionError::MissingCredentials),
        }
    }

    /// POST /pages: create a page in the database. `date` is the day shown in the title.
    pub async fn create_page(
        &self,
        transcript: &str,
        summary: &str,
        platform: Platform,
        date: NaiveDate,
    ) -> Result<PersistOutcome, NotionError> {
        let (api_key, database_id) = self.credentials()?;
        let language = lang::detect(transcript);
        let title = build_title(platform, language, date);
        let body = serde_json::json!({
            "parent": { "database_id": database_id },
            "properties": page_properties(&title, transcript, summary),
        });
        let url = format!("{}/pages", self.api_base);
        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("Notion-Version", &self.notion_version)
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(NotionError::Api {
                status: status.as_u16(),
                body,
            });
        }
        // The page exists once the status is 2xx; an unreadable body only loses the id.
        let page_id = res.json::<PageResponse>().await.ok().and_then(|p| p.id);
        Ok(PersistOutcome {
            status: status.as_u16(),
            page_id,
        })
    }

    /// POST /databases/{id}/query with an empty filter. Returns the HTTP status and body
    /// whatever they are; used to check that the integration can see the database.
    pub async fn query_database(&self) -> Result<(u16, serde_json::Value), NotionError> {
        let (api_key, database_id) = self.credentials()?;
        let url = format!("{}/databases/{}/query", self.api_base, database_id.replace('-', ""));
        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("Notion-Version", &self.notion_version)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let status = res.status().as_u16();
        let body = res.json().await.unwrap_or(serde_json::Value::Null);
        Ok((status, body))
    }
}

#[async_trait]
impl SummaryStore for NotionClient {
    async fn persist(
        &self,
        transcript: &str,
        summary: &str,
        platform: Platform,
    ) -> Result<PersistOutcome, NotionError> {
        let today = chrono::Local::now().date_naive();
        self.create_page(transcript, summary, platform, today).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    fn client(server: &MockServer) -> NotionClient {
        let config = NotionConfig {
            api_base: Some(server.uri()),
            ..NotionConfig::default()
        };
        NotionClient::new(Some("secret_x".to_string()), Some("db-1".to_string()), &config)
    }

    #[test]
    fn long_text_truncates_to_limit_plus_marker() {
        let input = "a".repeat(2500);
        let out = truncate(&input, MAX_FIELD_CHARS);
        assert_eq!(out.chars().count(), 1903);
        assert!(out.ends_with("..."));
        assert_eq!(&out[..1900], "a".repeat(1900));
    }

    #[test]
    fn text_at_limit_is_untouched() {
        let input = "b".repeat(1900);
        assert_eq!(truncate(&input, MAX_FIELD_CHARS), input);
        assert_eq!(truncate("", MAX_FIELD_CHARS), "");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let input = "ệ".repeat(2000);
        let out = truncate(&input, MAX_FIELD_CHARS);
        assert_eq!(out.chars().count(), 1903);
        assert!(out.starts_with("ệệ"));
    }

    #[test]
    fn titles_are_localized() {
        assert_eq!(
            build_title(Platform::Lark, Language::Vietnamese, date()),
            "[Lark] Tóm tắt cuộc họp - 07/03/2024"
        );
        assert_eq!(
            build_title(Platform::Slack, Language::Japanese, date()),
            "[Slack] 会議の要約 - 2024年03月07日"
        );
        assert_eq!(
            build_title(Platform::Slack, Language::Korean, date()),
            "[Slack] 회의 요약 - 2024년 03월 07일"
        );
        assert_eq!(
            build_title(Platform::Lark, Language::Chinese, date()),
            "[Lark] 会议摘要 - 2024年03月07日"
        );
        assert_eq!(
            build_title(Platform::Slack, Language::English, date()),
            "[Slack] Meeting Summary - Mar 07, 2024"
        );
        assert_eq!(
            build_title(Platform::Lark, Language::Other, date()),
            "[Lark] Meeting Summary - Mar 07, 2024"
        );
    }

    #[tokio::test]
    async fn create_page_sends_schema() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pages"))
            .and(header("authorization", "Bearer secret_x"))
            .and(header("notion-version", "2022-06-28"))
            .and(body_partial_json(serde_json::json!({
                "parent": { "database_id": "db-1" },
                "properties": {
                    "Meeting Title": { "title": [{ "text": { "content": "[Lark] Meeting Summary - Mar 07, 2024" } }] },
                    "Summary": { "rich_text": [{ "text": { "content": "Roadmap agreed." } }] }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "object": "page", "id": "page-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server)
            .create_page(
                "We discussed the roadmap for the third quarter and agreed on priorities.",
                "Roadmap agreed.",
                Platform::Lark,
                date(),
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            PersistOutcome {
                status: 200,
                page_id: Some("page-1".to_string())
            }
        );
    }

    #[tokio::test]
    async fn long_fields_are_capped_on_the_wire() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "p" })))
            .mount(&server)
            .await;

        let long = "word ".repeat(600);
        client(&server)
            .create_page(&long, &long, Platform::Slack, date())
            .await
            .unwrap();

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        for field in ["Full Transcript", "Summary"] {
            let content = body["properties"][field]["rich_text"][0]["text"]["content"]
                .as_str()
                .unwrap();
            assert_eq!(content.chars().count(), MAX_FIELD_CHARS + 3);
            assert!(content.ends_with("..."));
        }
    }

    #[tokio::test]
    async fn rejected_write_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pages"))
            .respond_with(ResponseTemplate::new(400).set_body_string("validation_error"))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_page("t", "s", Platform::Lark, date())
            .await
            .unwrap_err();
        assert!(matches!(err, NotionError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn stored_page_with_unreadable_body_still_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pages"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let saved = client(&server)
            .create_page("t", "s", Platform::Lark, date())
            .await
            .unwrap();
        assert_eq!(saved, PersistOutcome { status: 200, page_id: None });
    }

    #[tokio::test]
    async fn missing_database_is_not_configured() {
        let notion = NotionClient::new(Some("k".to_string()), None, &NotionConfig::default());
        assert!(matches!(
            notion.persist("t", "s", Platform::Lark).await,
            Err(NotionError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn query_strips_dashes_from_database_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/databases/abc123def/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "object": "list", "results": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let config = NotionConfig {
            api_base: Some(server.uri()),
            ..NotionConfig::default()
        };
        let notion = NotionClient::new(Some("k".to_string()), Some("abc-123-def".to_string()), &config);
        let (status, body) = notion.query_database().await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(body["object"], "list");
    }
}
