//! Trigger keywords: a message is summarized only when it starts with one of them.

use crate::channels::Platform;
use regex::Regex;
use std::sync::OnceLock;

/// Keywords recognized in Lark chats (lowercase).
pub const LARK_TRIGGERS: &[&str] = &["/summary", "/tóm tắt", "/tomtat", "!summary", "!tóm tắt"];

/// Keywords recognized in Slack channels (lowercase). Slash commands are taken by Slack itself.
pub const SLACK_TRIGGERS: &[&str] = &["!summary", "!tóm tắt", "!tomtat", "summary:", "tóm tắt:"];

fn mention_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<@U[A-Z0-9]+>").expect("mention pattern is valid"))
}

/// Remove Slack user mentions (`<@U0123ABC>`) and trim.
pub fn strip_slack_mentions(text: &str) -> String {
    mention_pattern().replace_all(text, "").trim().to_string()
}

/// Case-insensitive prefix match of the trimmed text against `keywords`.
pub fn matches_trigger(text: &str, keywords: &[&str]) -> bool {
    let lowered = text.trim().to_lowercase();
    keywords.iter().any(|k| lowered.starts_with(k))
}

/// Drop the first word: everything after the first whitespace run.
/// A text with no whitespace leaves nothing (`"/summary"` → `""`).
pub fn strip_trigger(text: &str) -> String {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(i) => text[i..].trim_start().to_string(),
        None => String::new(),
    }
}

/// Returns the text to summarize when `text` carries a trigger for `platform`, otherwise None.
pub fn parse(platform: Platform, text: &str) -> Option<String> {
    match platform {
        Platform::Lark => matches_trigger(text, LARK_TRIGGERS).then(|| strip_trigger(text)),
        Platform::Slack => {
            let text = strip_slack_mentions(text);
            matches_trigger(&text, SLACK_TRIGGERS).then(|| strip_trigger(&text))
        }
    }
}
