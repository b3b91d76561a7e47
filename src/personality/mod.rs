//! Personality traits and the emotion-driven update pipeline.
//!
//! ```text
//! text ─▶ EmotionClassifier ─▶ Emotion
//!                                 │
//!          TraitStore::load ──▶ TraitStore::nudge ──▶ TraitStore::save
//!                                                         │
//!                               EventBus "personality:updated" ◀─┘
//! ```

pub mod nudge;
pub mod pipeline;
pub mod store;
pub mod traits;

pub use nudge::{emotion_target, DefaultNudgeRule, EmotionTarget, NudgeRule, DEFAULT_NUDGE_RATE};
pub use pipeline::{MessageOutcome, PersonalityPipeline, DEFAULT_CHARACTER_ID};
pub use store::{InMemoryTraitStore, SqliteTraitStore, TraitStore};
pub use traits::{average, average_value, TraitSet, NEUTRAL_AVERAGE};
