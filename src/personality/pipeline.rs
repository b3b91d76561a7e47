//! The emotion → personality update pipeline.
//!
//! Incoming text is classified, the resulting emotion is handed to the trait
//! store's nudge rule, the new trait set is persisted and then published as
//! [`PERSONALITY_UPDATED`] on the event bus.
//!
//! Failures never reach the caller as errors. A missing or failing store is
//! logged and the update is skipped without publishing.
//!
//! Updates for the same character are not serialized here: the store's
//! `load` and `save` are separate calls, so two overlapping updates can both
//! read the old traits and the later `save` wins.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::store::TraitStore;
use super::traits::{average, TraitSet};
use crate::emotion::{Classification, Emotion, EmotionClassifier, LanguageHint};
use crate::events::{EventBus, EMOTION_DETECTED, PERSONALITY_UPDATED};

/// Character used when a call does not name one.
pub const DEFAULT_CHARACTER_ID: &str = "default";

/// Outcome of [`PersonalityPipeline::handle_message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageOutcome {
    pub classification: Classification,
    /// The persisted traits, or `None` when the update was skipped.
    pub traits: Option<TraitSet>,
}

/// Orchestrates classification, trait updates and notifications.
pub struct PersonalityPipeline {
    bus: EventBus,
    store: Option<Arc<dyn TraitStore>>,
    classifier: EmotionClassifier,
    default_character: String,
}

impl std::fmt::Debug for PersonalityPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalityPipeline")
            .field("bus", &self.bus)
            .field("has_store", &self.store.is_some())
            .field("default_character", &self.default_character)
            .finish()
    }
}

impl PersonalityPipeline {
    /// A pipeline without a store; updates are logged no-ops until one is set.
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            store: None,
            classifier: EmotionClassifier::default(),
            default_character: DEFAULT_CHARACTER_ID.to_string(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn TraitStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_classifier(mut self, classifier: EmotionClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_default_character(mut self, character_id: impl Into<String>) -> Self {
        self.default_character = character_id.into();
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn classifier(&self) -> &EmotionClassifier {
        &self.classifier
    }

    pub fn store(&self) -> Option<&Arc<dyn TraitStore>> {
        self.store.as_ref()
    }

    pub fn default_character(&self) -> &str {
        &self.default_character
    }

    fn character<'a>(&'a self, character_id: Option<&'a str>) -> &'a str {
        character_id.unwrap_or(&self.default_character)
    }

    // -----------------------------------------------------------------------
    // Updates
    // -----------------------------------------------------------------------

    /// Nudge the stored traits of a character toward `emotion`.
    ///
    /// Returns the persisted traits, or `None` when there is no store or the
    /// store failed. [`PERSONALITY_UPDATED`] is published only after a
    /// successful save.
    pub async fn update_from_emotion(
        &self,
        emotion: Emotion,
        text: &str,
        character_id: Option<&str>,
    ) -> Option<TraitSet> {
        let character_id = self.character(character_id);
        let Some(store) = self.store.as_ref() else {
            log::warn!(
                "[PersonalityPipeline] No trait store configured; skipping '{}' update for '{}'",
                emotion,
                character_id
            );
            return None;
        };

        let current = match store.load(character_id).await {
            Ok(traits) => traits,
            Err(e) => {
                log::warn!(
                    "[PersonalityPipeline] Failed to load traits for '{}': {}",
                    character_id,
                    e
                );
                return None;
            }
        };

        let updated = store.nudge(emotion, text, &current).finite();

        if let Err(e) = store.save(character_id, &updated).await {
            log::error!(
                "[PersonalityPipeline] Failed to save traits for '{}': {}",
                character_id,
                e
            );
            return None;
        }

        log::debug!(
            "[PersonalityPipeline] '{}' applied to '{}' (average {} -> {})",
            emotion,
            character_id,
            average(&current),
            average(&updated)
        );
        self.bus.publish(PERSONALITY_UPDATED, updated.to_value());
        Some(updated)
    }

    /// [`update_from_emotion`](Self::update_from_emotion) for an untyped
    /// label; unknown labels count as `neutral`.
    pub async fn update_from_label(
        &self,
        label: &str,
        text: &str,
        character_id: Option<&str>,
    ) -> Option<TraitSet> {
        let emotion = Emotion::parse_lenient(label);
        self.update_from_emotion(emotion, text, character_id).await
    }

    /// Classify `text`, publish [`EMOTION_DETECTED`], then update traits.
    pub async fn handle_message(
        &self,
        text: &str,
        hint: LanguageHint,
        character_id: Option<&str>,
    ) -> MessageOutcome {
        let classification = self.classifier.analyze(text, hint);
        self.bus.publish(
            EMOTION_DETECTED,
            json!({
                "emotion": classification.emotion,
                "language": classification.language,
                "text": text,
            }),
        );
        let traits = self
            .update_from_emotion(classification.emotion, text, character_id)
            .await;
        MessageOutcome {
            classification,
            traits,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current traits of a character, or `None` without a working store.
    pub async fn current_traits(&self, character_id: Option<&str>) -> Option<TraitSet> {
        let character_id = self.character(character_id);
        let store = self.store.as_ref()?;
        match store.load(character_id).await {
            Ok(traits) => Some(traits),
            Err(e) => {
                log::warn!(
                    "[PersonalityPipeline] Failed to load traits for '{}': {}",
                    character_id,
                    e
                );
                None
            }
        }
    }

    /// Personality average of a character, computed by [`average`].
    pub async fn personality_average(&self, character_id: Option<&str>) -> Option<i64> {
        self.current_traits(character_id)
            .await
            .map(|traits| average(&traits))
    }
}
