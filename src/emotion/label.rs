//! The closed set of emotion labels produced by the classifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Emotion label assigned to a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Dancing,
    Romantic,
    Laughing,
    Surprise,
    Confident,
    Shy,
    Flirtatious,
    Kiss,
    Goodbye,
    Positive,
    Negative,
    Neutral,
}

/// Keyword-driven emotions in precedence order. The first match wins, so
/// e.g. "dancing" beats "romantic" for "I love dancing".
pub const EMOTION_PRIORITY: [Emotion; 9] = [
    Emotion::Dancing,
    Emotion::Romantic,
    Emotion::Laughing,
    Emotion::Surprise,
    Emotion::Confident,
    Emotion::Shy,
    Emotion::Flirtatious,
    Emotion::Kiss,
    Emotion::Goodbye,
];

/// Every label, keyword-driven ones first, then the sentiment outcomes.
pub const ALL_EMOTIONS: [Emotion; 12] = [
    Emotion::Dancing,
    Emotion::Romantic,
    Emotion::Laughing,
    Emotion::Surprise,
    Emotion::Confident,
    Emotion::Shy,
    Emotion::Flirtatious,
    Emotion::Kiss,
    Emotion::Goodbye,
    Emotion::Positive,
    Emotion::Negative,
    Emotion::Neutral,
];

impl Emotion {
    /// The wire name of this label (`"dancing"`, `"neutral"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dancing => "dancing",
            Self::Romantic => "romantic",
            Self::Laughing => "laughing",
            Self::Surprise => "surprise",
            Self::Confident => "confident",
            Self::Shy => "shy",
            Self::Flirtatious => "flirtatious",
            Self::Kiss => "kiss",
            Self::Goodbye => "goodbye",
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    /// Parse a label, mapping anything unknown to [`Emotion::Neutral`].
    pub fn parse_lenient(label: &str) -> Self {
        label.parse().unwrap_or(Self::Neutral)
    }

    /// Whether this label is decided by keyword tables rather than sentiment.
    pub fn is_keyword_driven(&self) -> bool {
        EMOTION_PRIORITY.contains(self)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`Emotion::from_str`] for labels outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown emotion label: '{0}'")]
pub struct UnknownEmotion(pub String);

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ALL_EMOTIONS
            .iter()
            .copied()
            .find(|e| e.as_str() == normalized)
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}
