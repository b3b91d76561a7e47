//! Language codes, language hints and best-effort language detection.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Languages with keyword tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
    De,
    Es,
    It,
    Ja,
    Zh,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::De => "de",
            Self::Es => "es",
            Self::It => "it",
            Self::Ja => "ja",
            Self::Zh => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    /// Accepts bare codes and locale tags (`"fr"`, `"fr-FR"`, `"de_AT"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let primary = s
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match primary.as_str() {
            "en" => Ok(Self::En),
            "fr" => Ok(Self::Fr),
            "de" => Ok(Self::De),
            "es" => Ok(Self::Es),
            "it" => Ok(Self::It),
            "ja" => Ok(Self::Ja),
            "zh" => Ok(Self::Zh),
            _ => Err(format!("Unsupported language: '{}'", s)),
        }
    }
}

/// How the classifier should pick a keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LanguageHint {
    /// Infer the language from the text.
    #[default]
    Auto,
    /// Use the given language.
    Fixed(Language),
}

impl LanguageHint {
    /// Parse a hint. `"auto"` selects detection; unsupported tags fall back
    /// to English.
    pub fn parse(hint: &str) -> Self {
        if hint.trim().eq_ignore_ascii_case("auto") {
            return Self::Auto;
        }
        match hint.parse::<Language>() {
            Ok(lang) => Self::Fixed(lang),
            Err(_) => {
                log::debug!("[LanguageHint] Unsupported hint '{}', using en", hint);
                Self::Fixed(Language::En)
            }
        }
    }

    /// Resolve the hint against `text`.
    pub fn resolve(&self, text: &str) -> Language {
        match self {
            Self::Auto => detect_language(text),
            Self::Fixed(lang) => *lang,
        }
    }
}

impl From<String> for LanguageHint {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<LanguageHint> for String {
    fn from(value: LanguageHint) -> Self {
        value.to_string()
    }
}

impl From<Language> for LanguageHint {
    fn from(value: Language) -> Self {
        Self::Fixed(value)
    }
}

impl fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed(lang) => write!(f, "{}", lang),
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

static KANA: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{Hiragana}\p{Katakana}]").unwrap());
static HAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Han}").unwrap());
static GERMAN_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[äöüß]").unwrap());
static SPANISH_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ñÑ¡¿]").unwrap());
static FRENCH_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[çœæâêîôûëïÿ]").unwrap());
static ITALIAN_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[àèéìíòóùú]").unwrap());

// Marker words must not be common English tokens ("yo", "ho", "das", ...).
static FRENCH_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\bc'est\b|\b(je|tu|nous|vous|suis|pas|oui|merci|bonjour|avec|mais|trop|très)\b)",
    )
    .unwrap()
});
static GERMAN_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(ich|nicht|und|bist|danke|hallo|sehr|ist|auch)\b").unwrap()
});
static SPANISH_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(estoy|está|muy|gracias|hola|pero|eres|que|tengo)\b").unwrap()
});
static ITALIAN_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(sono|molto|grazie|ciao|sei|anche|perché)\b").unwrap()
});

/// Infer a language from character classes, then marker words.
///
/// Checks run in a fixed order and the first hit wins: kana (ja), Han
/// ideographs (zh), German, Spanish and French letters, then French,
/// German, Spanish and Italian marker words, then the accented vowels
/// shared by Italian and the Romance languages above (it). Anything else
/// is `en`.
pub fn detect_language(text: &str) -> Language {
    let checks: [(&Lazy<Regex>, Language); 10] = [
        (&KANA, Language::Ja),
        (&HAN, Language::Zh),
        (&GERMAN_CHARS, Language::De),
        (&SPANISH_CHARS, Language::Es),
        (&FRENCH_CHARS, Language::Fr),
        (&FRENCH_WORDS, Language::Fr),
        (&GERMAN_WORDS, Language::De),
        (&SPANISH_WORDS, Language::Es),
        (&ITALIAN_WORDS, Language::It),
        (&ITALIAN_CHARS, Language::It),
    ];
    checks
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, lang)| *lang)
        .unwrap_or(Language::En)
}
