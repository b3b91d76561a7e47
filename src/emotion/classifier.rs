//! Keyword-based emotion classification.
//!
//! Classification is a pure function of the text, the language hint and the
//! keyword tables. Keyword-driven emotions are checked in
//! [`EMOTION_PRIORITY`] order and the first hit wins; if none matches, the
//! positive and negative word lists decide between `positive`, `negative`
//! and `neutral`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::keywords::KeywordConfig;
use super::label::{Emotion, EMOTION_PRIORITY};
use super::language::{Language, LanguageHint};

/// Result of classifying one text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub emotion: Emotion,
    pub language: Language,
}

/// Maps text to an [`Emotion`] using a [`KeywordConfig`].
#[derive(Debug, Clone)]
pub struct EmotionClassifier {
    keywords: Arc<KeywordConfig>,
}

impl Default for EmotionClassifier {
    fn default() -> Self {
        Self::new(KeywordConfig::default())
    }
}

impl EmotionClassifier {
    pub fn new(keywords: KeywordConfig) -> Self {
        Self {
            keywords: Arc::new(keywords),
        }
    }

    /// The tables this classifier reads.
    pub fn keywords(&self) -> &KeywordConfig {
        &self.keywords
    }

    /// Classify `text`, returning only the label.
    pub fn classify(&self, text: &str, hint: LanguageHint) -> Emotion {
        self.analyze(text, hint).emotion
    }

    /// Classify an arbitrary JSON value. Anything but a string is `neutral`.
    pub fn classify_value(&self, text: &Value, hint: LanguageHint) -> Emotion {
        match text.as_str() {
            Some(s) => self.classify(s, hint),
            None => Emotion::Neutral,
        }
    }

    /// Classify `text` and report which keyword table was used.
    pub fn analyze(&self, text: &str, hint: LanguageHint) -> Classification {
        if text.trim().is_empty() {
            let language = match hint {
                LanguageHint::Fixed(lang) => lang,
                LanguageHint::Auto => Language::En,
            };
            return Classification {
                emotion: Emotion::Neutral,
                language,
            };
        }

        let language = hint.resolve(text);
        let haystack = text.to_lowercase();

        let emotion = EMOTION_PRIORITY
            .iter()
            .copied()
            .find(|emotion| self.keywords.keywords(language, *emotion).any_in(&haystack))
            .unwrap_or_else(|| self.sentiment(&haystack, language));

        Classification { emotion, language }
    }

    /// Sentiment fallback over lowercased text: exactly one polarity present
    /// decides, both or neither is neutral.
    fn sentiment(&self, haystack: &str, language: Language) -> Emotion {
        let positive = self
            .keywords
            .keywords(language, Emotion::Positive)
            .any_in(haystack);
        let negative = self
            .keywords
            .keywords(language, Emotion::Negative)
            .any_in(haystack);
        match (positive, negative) {
            (true, false) => Emotion::Positive,
            (false, true) => Emotion::Negative,
            _ => Emotion::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classifier() -> EmotionClassifier {
        EmotionClassifier::default()
    }

    fn en() -> LanguageHint {
        LanguageHint::Fixed(Language::En)
    }

    #[test]
    fn test_keyword_precedence_over_sentiment() {
        assert_eq!(
            classifier().classify("I love dancing tonight", en()),
            Emotion::Dancing
        );
    }

    #[test]
    fn test_priority_order_between_emotions() {
        let c = classifier();
        // "love" (romantic) beats "haha" (laughing).
        assert_eq!(c.classify("haha I love it", en()), Emotion::Romantic);
        // "wow" (surprise) beats "kiss".
        assert_eq!(c.classify("wow, a kiss!", en()), Emotion::Surprise);
        assert_eq!(c.classify("Goodbye for now", en()), Emotion::Goodbye);
    }

    #[test]
    fn test_empty_text_is_neutral() {
        let c = classifier();
        assert_eq!(c.classify("", en()), Emotion::Neutral);
        assert_eq!(c.classify("   ", LanguageHint::Auto), Emotion::Neutral);
    }

    #[test]
    fn test_non_string_value_is_neutral() {
        let c = classifier();
        assert_eq!(c.classify_value(&json!(42), en()), Emotion::Neutral);
        assert_eq!(c.classify_value(&json!(null), en()), Emotion::Neutral);
        assert_eq!(c.classify_value(&json!({"text": "kiss"}), en()), Emotion::Neutral);
        assert_eq!(c.classify_value(&json!("mwah"), en()), Emotion::Kiss);
    }

    #[test]
    fn test_case_insensitive_match() {
        assert_eq!(classifier().classify("LOL that was good", en()), Emotion::Laughing);
    }

    #[test]
    fn test_sentiment_fallback() {
        let c = classifier();
        assert_eq!(c.classify("what a great day", en()), Emotion::Positive);
        assert_eq!(c.classify("I feel sad", en()), Emotion::Negative);
        assert_eq!(c.classify("good and bad", en()), Emotion::Neutral);
        assert_eq!(c.classify("the sky is blue", en()), Emotion::Neutral);
    }

    #[test]
    fn test_auto_detects_french_sentiment() {
        let result = classifier().analyze("c'est terrible", LanguageHint::Auto);
        assert_eq!(result.language, Language::Fr);
        assert_eq!(result.emotion, Emotion::Negative);
    }

    #[test]
    fn test_auto_detection_picks_the_right_table() {
        let c = classifier();
        assert_eq!(
            c.analyze("è terribile", LanguageHint::Auto),
            Classification {
                emotion: Emotion::Negative,
                language: Language::It
            }
        );
        assert_eq!(
            c.analyze("yo I hate this", LanguageHint::Auto),
            Classification {
                emotion: Emotion::Negative,
                language: Language::En
            }
        );
        assert_eq!(
            c.analyze("ho ho ho, I love you", LanguageHint::Auto),
            Classification {
                emotion: Emotion::Romantic,
                language: Language::En
            }
        );
    }

    #[test]
    fn test_language_specific_tables() {
        let c = classifier();
        assert_eq!(c.classify("on va danser ?", LanguageHint::parse("fr")), Emotion::Dancing);
        assert_eq!(c.classify("Tschüss!", LanguageHint::Auto), Emotion::Goodbye);
        assert_eq!(c.classify("te quiero mucho", LanguageHint::parse("es")), Emotion::Romantic);
        assert_eq!(c.classify("またね", LanguageHint::Auto), Emotion::Goodbye);
        assert_eq!(c.classify("哈哈哈", LanguageHint::Auto), Emotion::Laughing);
    }

    #[test]
    fn test_missing_language_table_falls_back_to_english() {
        let config = KeywordConfig::from_json(
            r#"{"en": {"emotions": {"kiss": ["smooch"]}, "positive": ["yay"], "negative": ["boo"]}}"#,
        )
        .unwrap();
        let c = EmotionClassifier::new(config);
        let hint = LanguageHint::Fixed(Language::De);
        assert_eq!(c.classify("smooch", hint), Emotion::Kiss);
        assert_eq!(c.classify("yay", hint), Emotion::Positive);
        // Built-in defaults for emotions nobody configured.
        assert_eq!(c.classify("let's dance", hint), Emotion::Dancing);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = classifier();
        let first = c.analyze("Wow you look cute", LanguageHint::Auto);
        for _ in 0..10 {
            assert_eq!(c.analyze("Wow you look cute", LanguageHint::Auto), first);
        }
        assert_eq!(first.emotion, Emotion::Surprise);
    }
}
