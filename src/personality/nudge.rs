//! Nudge rules: how an emotion moves a stored trait set.
//!
//! The rule belongs to the trait store; the pipeline only asks the store to
//! apply it. A rule must return a set with exactly the names it was given.

use crate::emotion::Emotion;

use super::traits::TraitSet;

/// Fraction of the distance to the target covered by one nudge.
pub const DEFAULT_NUDGE_RATE: f64 = 0.1;

/// Lower bound of a trait score.
pub const TRAIT_MIN: f64 = 0.0;
/// Upper bound of a trait score.
pub const TRAIT_MAX: f64 = 100.0;

/// Moves traits toward a target implied by an emotion.
pub trait NudgeRule: Send + Sync {
    /// Return the nudged copy of `traits`. Names must be preserved.
    fn nudge(&self, emotion: Emotion, text: &str, traits: &TraitSet) -> TraitSet;
}

impl<F> NudgeRule for F
where
    F: Fn(Emotion, &str, &TraitSet) -> TraitSet + Send + Sync,
{
    fn nudge(&self, emotion: Emotion, text: &str, traits: &TraitSet) -> TraitSet {
        self(emotion, text, traits)
    }
}

/// Target scores an emotion pulls toward.
#[derive(Debug, Clone, Copy)]
pub struct EmotionTarget {
    /// Target for traits without a specific entry.
    pub general: f64,
    /// Trait-specific targets.
    pub specific: &'static [(&'static str, f64)],
}

impl EmotionTarget {
    fn target_for(&self, name: &str) -> f64 {
        self.specific
            .iter()
            .find(|(trait_name, _)| trait_name.eq_ignore_ascii_case(name))
            .map(|(_, target)| *target)
            .unwrap_or(self.general)
    }
}

/// Targets used by [`DefaultNudgeRule`]. `None` leaves traits unchanged.
pub fn emotion_target(emotion: Emotion) -> Option<EmotionTarget> {
    let target = match emotion {
        Emotion::Dancing => EmotionTarget {
            general: 60.0,
            specific: &[("energy", 85.0), ("playfulness", 80.0), ("extraversion", 75.0)],
        },
        Emotion::Romantic => EmotionTarget {
            general: 60.0,
            specific: &[("warmth", 85.0), ("affection", 90.0), ("openness", 65.0)],
        },
        Emotion::Laughing => EmotionTarget {
            general: 60.0,
            specific: &[("humor", 85.0), ("playfulness", 80.0), ("warmth", 65.0)],
        },
        Emotion::Surprise => EmotionTarget {
            general: 55.0,
            specific: &[("openness", 75.0), ("curiosity", 80.0)],
        },
        Emotion::Confident => EmotionTarget {
            general: 60.0,
            specific: &[("confidence", 85.0), ("extraversion", 70.0)],
        },
        Emotion::Shy => EmotionTarget {
            general: 45.0,
            specific: &[("shyness", 80.0), ("confidence", 35.0), ("extraversion", 35.0)],
        },
        Emotion::Flirtatious => EmotionTarget {
            general: 60.0,
            specific: &[("playfulness", 80.0), ("confidence", 70.0), ("affection", 70.0)],
        },
        Emotion::Kiss => EmotionTarget {
            general: 60.0,
            specific: &[("affection", 90.0), ("warmth", 80.0)],
        },
        Emotion::Goodbye => EmotionTarget {
            general: 50.0,
            specific: &[],
        },
        Emotion::Positive => EmotionTarget {
            general: 65.0,
            specific: &[("warmth", 70.0)],
        },
        Emotion::Negative => EmotionTarget {
            general: 35.0,
            specific: &[("warmth", 40.0), ("shyness", 60.0)],
        },
        Emotion::Neutral => return None,
    };
    Some(target)
}

/// Moves every finite trait `rate` of the way to its target, clamped to
/// 0–100 and rounded to two decimals. Each `!` in the text (up to two) adds
/// a quarter to the rate.
#[derive(Debug, Clone, Copy)]
pub struct DefaultNudgeRule {
    pub rate: f64,
}

impl Default for DefaultNudgeRule {
    fn default() -> Self {
        Self {
            rate: DEFAULT_NUDGE_RATE,
        }
    }
}

impl DefaultNudgeRule {
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
        }
    }

    fn effective_rate(&self, text: &str) -> f64 {
        let emphasis = text.matches('!').take(2).count() as f64;
        (self.rate * (1.0 + 0.25 * emphasis)).min(1.0)
    }
}

impl NudgeRule for DefaultNudgeRule {
    fn nudge(&self, emotion: Emotion, text: &str, traits: &TraitSet) -> TraitSet {
        let Some(target) = emotion_target(emotion) else {
            return traits.clone();
        };
        let rate = self.effective_rate(text);
        traits
            .iter()
            .map(|(name, score)| {
                if !score.is_finite() {
                    return (name, score);
                }
                let moved = score + (target.target_for(name) - score) * rate;
                let clamped = moved.clamp(TRAIT_MIN, TRAIT_MAX);
                (name, (clamped * 100.0).round() / 100.0)
            })
            .collect()
    }
}
