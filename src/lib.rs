//! # Companion
//!
//! Emotion-aware personality core for a companion character.
//!
//! Incoming text is classified into a closed set of emotions, the emotion
//! nudges the character's persisted personality traits, and every change is
//! published on an in-process event bus for UI and other observers.
//!
//! - [`events`]: synchronous publish/subscribe bus with isolated handlers
//!   and a bounded diagnostic buffer.
//! - [`emotion`]: multilingual keyword classifier.
//! - [`personality`]: trait sets, nudge rules, trait stores and the update
//!   pipeline.
//! - [`simulation`]: scripted harness that tabulates trait evolution.
//! - [`utilities`]: configuration and error types.

pub mod emotion;
pub mod events;
pub mod personality;
pub mod simulation;
pub mod utilities;

pub use emotion::{Classification, Emotion, EmotionClassifier, KeywordConfig, Language, LanguageHint};
pub use events::{Event, EventBus, Subscription, SubscriptionId};
pub use personality::{
    average, average_value, DefaultNudgeRule, InMemoryTraitStore, NudgeRule, PersonalityPipeline,
    SqliteTraitStore, TraitSet, TraitStore,
};
pub use simulation::{render_table, Simulation, SimulationRow, SimulationStep};
pub use utilities::config::CompanionConfig;
pub use utilities::errors::{ConfigError, StoreError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
