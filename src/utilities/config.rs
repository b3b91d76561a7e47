//! Runtime configuration.
//!
//! [`CompanionConfig`] is read from YAML or JSON (chosen by file extension),
//! then optionally overridden from the environment:
//!
//! - `COMPANION_DIAGNOSTICS`: `1`, `true`, `on` or `yes` enables event recording
//! - `COMPANION_CHARACTER`: default character id
//! - `COMPANION_LANGUAGE`: language hint (`auto`, `en`, `fr`, ...)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::emotion::{EmotionClassifier, KeywordConfig, LanguageHint};
use crate::events::{EventBus, DEFAULT_DIAGNOSTIC_CAPACITY};
use crate::personality::{
    DefaultNudgeRule, InMemoryTraitStore, PersonalityPipeline, TraitSet, DEFAULT_CHARACTER_ID,
    DEFAULT_NUDGE_RATE,
};
use crate::utilities::errors::ConfigError;

/// Largest accepted diagnostic buffer.
pub const MAX_DIAGNOSTIC_CAPACITY: usize = 100_000;

/// Event-bus diagnostics settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub capacity: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: DEFAULT_DIAGNOSTIC_CAPACITY,
        }
    }
}

/// Top-level configuration of the companion core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    pub diagnostics: DiagnosticsConfig,
    /// Character used when callers do not name one.
    pub default_character_id: String,
    pub language_hint: LanguageHint,
    /// External keyword tables; the embedded tables are used when unset.
    pub keywords_path: Option<PathBuf>,
    /// Traits handed out for characters that have never been saved.
    pub initial_traits: TraitSet,
    /// Rate of the default nudge rule (0, 1].
    pub nudge_rate: f64,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            diagnostics: DiagnosticsConfig::default(),
            default_character_id: DEFAULT_CHARACTER_ID.to_string(),
            language_hint: LanguageHint::Auto,
            keywords_path: None,
            initial_traits: [
                ("openness", 50.0),
                ("warmth", 50.0),
                ("playfulness", 50.0),
                ("confidence", 50.0),
                ("affection", 50.0),
            ]
            .into_iter()
            .collect(),
            nudge_rate: DEFAULT_NUDGE_RATE,
        }
    }
}

impl CompanionConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or JSON file.
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

    /// Apply `COMPANION_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(flag) = lookup("COMPANION_DIAGNOSTICS") {
            self.diagnostics.enabled = matches!(
                flag.trim().to_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
        if let Some(character) = lookup("COMPANION_CHARACTER") {
            if !character.trim().is_empty() {
                self.default_character_id = character.trim().to_string();
            }
        }
        if let Some(language) = lookup("COMPANION_LANGUAGE") {
            self.language_hint = LanguageHint::parse(&language);
        }
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.nudge_rate > 0.0 && self.nudge_rate <= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "nudge_rate".to_string(),
                message: format!("must be in (0, 1], got {}", self.nudge_rate),
            });
        }
        if self.diagnostics.capacity > MAX_DIAGNOSTIC_CAPACITY {
            return Err(ConfigError::InvalidValue {
                key: "diagnostics.capacity".to_string(),
                message: format!(
                    "must be at most {}, got {}",
                    MAX_DIAGNOSTIC_CAPACITY, self.diagnostics.capacity
                ),
            });
        }
        if self.default_character_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "default_character_id".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The configured keyword tables, or the embedded ones.
    pub fn keyword_config(&self) -> Result<KeywordConfig, ConfigError> {
        match &self.keywords_path {
            Some(path) => KeywordConfig::from_path(path),
            None => Ok(KeywordConfig::default()),
        }
    }

    /// A bus with the configured diagnostics settings.
    pub fn build_bus(&self) -> EventBus {
        let bus = EventBus::with_diagnostic_capacity(self.diagnostics.capacity);
        bus.set_diagnostics(self.diagnostics.enabled);
        bus
    }

    /// An in-memory store seeded with `initial_traits`.
    pub fn build_memory_store(&self) -> InMemoryTraitStore {
        InMemoryTraitStore::new()
            .with_seed(self.initial_traits.clone())
            .with_rule(DefaultNudgeRule::new(self.nudge_rate))
    }

    /// A pipeline over `bus` and an in-memory store, using the configured
    /// keyword tables and default character.
    pub fn build_pipeline(&self, bus: EventBus) -> Result<PersonalityPipeline, ConfigError> {
        let classifier = EmotionClassifier::new(self.keyword_config()?);
        Ok(PersonalityPipeline::new(bus)
            .with_store(Arc::new(self.build_memory_store()))
            .with_classifier(classifier)
            .with_default_character(self.default_character_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::Language;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = CompanionConfig::default();
        assert!(!config.diagnostics.enabled);
        assert_eq!(config.diagnostics.capacity, 300);
        assert_eq!(config.default_character_id, "default");
        assert_eq!(config.language_hint, LanguageHint::Auto);
        assert_eq!(config.initial_traits.average(), 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "diagnostics:\n  enabled: true\nlanguage_hint: fr\nnudge_rate: 0.25\n";
        let config = CompanionConfig::from_yaml(yaml).unwrap();
        assert!(config.diagnostics.enabled);
        assert_eq!(config.diagnostics.capacity, 300);
        assert_eq!(config.language_hint, LanguageHint::Fixed(Language::Fr));
        assert_eq!(config.nudge_rate, 0.25);
        assert_eq!(config.default_character_id, "default");
    }

    #[test]
    fn test_json_initial_traits() {
        let json = r#"{"initial_traits": {"warmth": 70, "openness": 30}}"#;
        let config = CompanionConfig::from_json(json).unwrap();
        assert_eq!(config.initial_traits.len(), 2);
        assert_eq!(config.initial_traits.get("warmth"), Some(70.0));
    }

    #[test]
    fn test_invalid_rate_is_rejected() {
        let err = CompanionConfig::from_json(r#"{"nudge_rate": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "nudge_rate"));
        assert!(CompanionConfig::from_json(r#"{"nudge_rate": 1.5}"#).is_err());
        assert!(CompanionConfig::from_json(r#"{"default_character_id": " "}"#).is_err());
    }

    #[test]
    fn test_oversized_diagnostic_capacity_is_rejected() {
        let err = CompanionConfig::from_yaml("diagnostics:\n  capacity: 18446744073709551615\n")
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "diagnostics.capacity")
        );

        let config = CompanionConfig::from_yaml("diagnostics:\n  capacity: 100000\n").unwrap();
        assert_eq!(config.build_bus().diagnostic_capacity(), MAX_DIAGNOSTIC_CAPACITY);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("COMPANION_DIAGNOSTICS", "on"),
            ("COMPANION_CHARACTER", " luna "),
            ("COMPANION_LANGUAGE", "de"),
        ]
        .into_iter()
        .collect();
        let config = CompanionConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert!(config.diagnostics.enabled);
        assert_eq!(config.default_character_id, "luna");
        assert_eq!(config.language_hint, LanguageHint::Fixed(Language::De));

        let config = config.with_overrides(|key| {
            (key == "COMPANION_DIAGNOSTICS").then(|| "off".to_string())
        });
        assert!(!config.diagnostics.enabled);
    }

    #[test]
    fn test_from_path_and_keyword_tables() {
        let dir = tempfile::tempdir().unwrap();
        let keywords = dir.path().join("keywords.json");
        std::fs::write(&keywords, r#"{"en": {"emotions": {"kiss": ["xoxo"]}}}"#).unwrap();
        let config_path = dir.path().join("companion.yml");
        std::fs::write(
            &config_path,
            format!("keywords_path: {}\n", keywords.display()),
        )
        .unwrap();

        let config = CompanionConfig::from_path(&config_path).unwrap();
        let tables = config.keyword_config().unwrap();
        assert!(tables
            .keywords(Language::En, crate::emotion::Emotion::Kiss)
            .any_in("xoxo"));
    }

    #[test]
    fn test_build_bus_applies_diagnostics() {
        let mut config = CompanionConfig::default();
        config.diagnostics = DiagnosticsConfig {
            enabled: true,
            capacity: 5,
        };
        let bus = config.build_bus();
        assert!(bus.diagnostics_enabled());
        assert_eq!(bus.diagnostic_capacity(), 5);
    }

    #[tokio::test]
    async fn test_build_pipeline_seeds_new_characters() {
        let config = CompanionConfig::default();
        let pipeline = config.build_pipeline(EventBus::new()).unwrap();
        assert_eq!(pipeline.default_character(), "default");

        let traits = pipeline
            .update_from_emotion(crate::emotion::Emotion::Kiss, "kiss", None)
            .await
            .unwrap();
        assert!(traits.same_names(&config.initial_traits));
        assert!(traits.get("affection").unwrap() > 50.0);
    }
}
