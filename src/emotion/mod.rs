//! Emotion classification.
//!
//! Text is mapped onto a closed set of [`Emotion`] labels using per-language
//! keyword tables ([`KeywordConfig`]). Keyword-driven emotions are checked
//! in the fixed [`EMOTION_PRIORITY`] order; when none matches, positive and
//! negative word lists decide the sentiment.

pub mod classifier;
pub mod keywords;
pub mod label;
pub mod language;

pub use classifier::{Classification, EmotionClassifier};
pub use keywords::{builtin_keywords, KeywordConfig, Keywords, LanguageTable};
pub use label::{Emotion, UnknownEmotion, ALL_EMOTIONS, EMOTION_PRIORITY};
pub use language::{detect_language, Language, LanguageHint};
