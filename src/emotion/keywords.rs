//! Keyword tables used by the emotion classifier.
//!
//! A [`KeywordConfig`] maps each [`Language`] to a [`LanguageTable`] holding
//! trigger substrings per keyword-driven emotion plus positive and negative
//! sentiment words. Lookups never fail: a missing language or entry falls
//! back to English, then to a small built-in list.
//!
//! Tables are validated and normalised (trimmed, lowercased, blanks
//! dropped) when they are constructed or deserialized, so lookups only need
//! to lowercase the input text.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::label::Emotion;
use super::language::Language;
use crate::utilities::errors::ConfigError;

/// Keyword tables embedded at compile time.
pub const DEFAULT_KEYWORDS_JSON: &str = include_str!("keywords.json");

static DEFAULT_KEYWORDS: Lazy<KeywordConfig> = Lazy::new(|| {
    KeywordConfig::from_json(DEFAULT_KEYWORDS_JSON)
        .expect("Failed to parse embedded keywords.json")
});

const BUILTIN_POSITIVE: &[&str] = &["good", "great", "happy", "love", "nice"];
const BUILTIN_NEGATIVE: &[&str] = &["bad", "sad", "angry", "hate", "terrible"];

/// Last-resort triggers for `emotion`, used when neither the requested
/// language nor English configures it.
pub fn builtin_keywords(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Dancing => &["dance", "dancing"],
        Emotion::Romantic => &["love", "romantic"],
        Emotion::Laughing => &["haha", "lol"],
        Emotion::Surprise => &["wow", "omg"],
        Emotion::Confident => &["confident", "proud"],
        Emotion::Shy => &["shy", "blush"],
        Emotion::Flirtatious => &["flirt", "cute"],
        Emotion::Kiss => &["kiss"],
        Emotion::Goodbye => &["bye", "goodbye"],
        Emotion::Positive => BUILTIN_POSITIVE,
        Emotion::Negative => BUILTIN_NEGATIVE,
        Emotion::Neutral => &[],
    }
}

// ---------------------------------------------------------------------------
// Keywords view
// ---------------------------------------------------------------------------

/// A resolved keyword list, either from configuration or built in.
#[derive(Debug, Clone, Copy)]
pub enum Keywords<'a> {
    Configured(&'a [String]),
    Builtin(&'static [&'static str]),
}

impl Keywords<'_> {
    /// Whether any keyword occurs in `haystack`, which must be lowercased.
    pub fn any_in(&self, haystack: &str) -> bool {
        match self {
            Self::Configured(list) => list.iter().any(|kw| haystack.contains(kw.as_str())),
            Self::Builtin(list) => list.iter().any(|kw| haystack.contains(kw)),
        }
    }

    /// Number of keywords in the list.
    pub fn len(&self) -> usize {
        match self {
            Self::Configured(list) => list.len(),
            Self::Builtin(list) => list.len(),
        }
    }

    /// Whether the list has no keywords; an empty list never matches.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the lookup fell through to the built-in list.
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin(_))
    }
}

// ---------------------------------------------------------------------------
// LanguageTable
// ---------------------------------------------------------------------------

/// Keywords for one language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageTable {
    /// Trigger substrings per keyword-driven emotion.
    #[serde(default)]
    pub emotions: HashMap<Emotion, Vec<String>>,
    /// Positive sentiment words. `None` defers to the fallback chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive: Option<Vec<String>>,
    /// Negative sentiment words. `None` defers to the fallback chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative: Option<Vec<String>>,
}

impl LanguageTable {
    fn normalize(&mut self) {
        for list in self.emotions.values_mut() {
            normalize_list(list);
        }
        if let Some(list) = self.positive.as_mut() {
            normalize_list(list);
        }
        if let Some(list) = self.negative.as_mut() {
            normalize_list(list);
        }
    }

    fn list_for(&self, emotion: Emotion) -> Option<&[String]> {
        match emotion {
            Emotion::Positive => self.positive.as_deref(),
            Emotion::Negative => self.negative.as_deref(),
            other => self.emotions.get(&other).map(Vec::as_slice),
        }
    }
}

fn normalize_list(list: &mut Vec<String>) {
    for kw in list.iter_mut() {
        *kw = kw.trim().to_lowercase();
    }
    // An empty trigger would match every text.
    list.retain(|kw| !kw.is_empty());
}

// ---------------------------------------------------------------------------
// KeywordConfig
// ---------------------------------------------------------------------------

/// Validated keyword tables for all configured languages.
///
/// Always contains an `en` table, which is the fallback for every lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "HashMap<Language, LanguageTable>",
    into = "HashMap<Language, LanguageTable>"
)]
pub struct KeywordConfig {
    languages: HashMap<Language, LanguageTable>,
}

impl KeywordConfig {
    /// Build a config from raw tables, validating and normalising them.
    pub fn new(mut languages: HashMap<Language, LanguageTable>) -> Result<Self, ConfigError> {
        if !languages.contains_key(&Language::En) {
            return Err(ConfigError::MissingFallbackLanguage);
        }
        for table in languages.values_mut() {
            table.normalize();
        }
        Ok(Self { languages })
    }

    /// The tables embedded in the crate.
    pub fn embedded() -> &'static KeywordConfig {
        &DEFAULT_KEYWORDS
    }

    /// Parse tables from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse tables from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load tables from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    /// The table for `language`, if configured.
    pub fn table(&self, language: Language) -> Option<&LanguageTable> {
        self.languages.get(&language)
    }

    /// Configured languages, sorted.
    pub fn languages(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self.languages.keys().copied().collect();
        langs.sort();
        langs
    }

    /// Keywords for `emotion` in `language`, following the fallback chain
    /// language entry, English entry, built-in list.
    ///
    /// `emotion` may also be [`Emotion::Positive`] or [`Emotion::Negative`]
    /// to fetch the sentiment word lists.
    pub fn keywords(&self, language: Language, emotion: Emotion) -> Keywords<'_> {
        let configured = self
            .table(language)
            .and_then(|t| t.list_for(emotion))
            .or_else(|| self.table(Language::En).and_then(|t| t.list_for(emotion)));
        match configured {
            Some(list) => Keywords::Configured(list),
            None => Keywords::Builtin(builtin_keywords(emotion)),
        }
    }
}

impl TryFrom<HashMap<Language, LanguageTable>> for KeywordConfig {
    type Error = ConfigError;

    fn try_from(value: HashMap<Language, LanguageTable>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KeywordConfig> for HashMap<Language, LanguageTable> {
    fn from(value: KeywordConfig) -> Self {
        value.languages
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self::embedded().clone()
    }
}
