//! Best-effort language detection, used to pick the prompt and the page title locale.
//!
//! Detection never fails: text with no recognizable script (empty, digits, emoji)
//! resolves to [`FALLBACK`].

use whatlang::Lang;

/// Languages the prompts and titles distinguish. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Vietnamese,
    Japanese,
    Korean,
    Chinese,
    English,
    Other,
}

/// Used whenever detection yields nothing.
pub const FALLBACK: Language = Language::Vietnamese;

impl From<Lang> for Language {
    fn from(lang: Lang) -> Self {
        match lang {
            Lang::Vie => Language::Vietnamese,
            Lang::Jpn => Language::Japanese,
            Lang::Kor => Language::Korean,
            Lang::Cmn => Language::Chinese,
            Lang::Eng => Language::English,
            _ => Language::Other,
        }
    }
}

/// Detect the dominant language of `text`.
pub fn detect(text: &str) -> Language {
    match whatlang::detect_lang(text) {
        Some(lang) => Language::from(lang),
        None => {
            log::debug!("language detection gave no result, using {:?}", FALLBACK);
            FALLBACK
        }
    }
}
