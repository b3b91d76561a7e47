//! Trait sets and the personality average.
//!
//! [`average`] is the only routine that summarises a trait set into a single
//! score; everything that needs a personality summary goes through it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Score reported for an empty or fully invalid trait set.
pub const NEUTRAL_AVERAGE: i64 = 50;

/// Named numeric personality dimensions (nominally 0–100).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitSet(BTreeMap<String, f64>);

impl TraitSet {
    /// An empty trait set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trait set from arbitrary JSON, keeping only finite numbers.
    /// Anything but an object yields an empty set.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };
        object
            .iter()
            .filter_map(|(name, v)| v.as_f64().filter(|n| n.is_finite()).map(|n| (name.clone(), n)))
            .collect()
    }

    /// The trait set as a JSON object. Non-finite scores are left out.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .filter(|(_, score)| score.is_finite())
            .map(|(name, score)| (name.clone(), Value::from(*score)))
            .collect();
        Value::Object(map)
    }

    /// Copy of the set without NaN or infinite scores.
    pub fn finite(&self) -> Self {
        self.iter().filter(|(_, score)| score.is_finite()).collect()
    }

    /// Score of `name`, if present.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Set the score of `name`, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, score: f64) -> Option<f64> {
        self.0.insert(name.into(), score)
    }

    /// Number of traits.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no traits.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Trait names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(name, score)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Whether both sets have exactly the same trait names.
    pub fn same_names(&self, other: &TraitSet) -> bool {
        self.0.keys().eq(other.0.keys())
    }

    /// See [`average`].
    pub fn average(&self) -> i64 {
        average(self)
    }
}

impl FromIterator<(String, f64)> for TraitSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, f64)> for TraitSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl From<BTreeMap<String, f64>> for TraitSet {
    fn from(value: BTreeMap<String, f64>) -> Self {
        Self(value)
    }
}

/// Rounded mean of the finite scores in `traits`, or [`NEUTRAL_AVERAGE`]
/// when there are none.
///
/// Rounding is half away from zero; for the nominal 0–100 range this is the
/// usual round-half-up.
pub fn average(traits: &TraitSet) -> i64 {
    mean_of(traits.0.values().copied())
}

/// [`average`] over untyped JSON. Non-numeric entries are skipped and a
/// non-object value counts as empty.
pub fn average_value(traits: &Value) -> i64 {
    match traits.as_object() {
        Some(object) => mean_of(object.values().filter_map(Value::as_f64)),
        None => NEUTRAL_AVERAGE,
    }
}

fn mean_of(scores: impl Iterator<Item = f64>) -> i64 {
    let (sum, count) = scores
        .filter(|n| n.is_finite())
        .fold((0.0_f64, 0_u32), |(sum, count), n| (sum + n, count + 1));
    if count == 0 {
        return NEUTRAL_AVERAGE;
    }
    (sum / f64::from(count)).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_average_of_empty_is_neutral() {
        assert_eq!(average(&TraitSet::new()), 50);
        assert_eq!(average_value(&json!({})), 50);
    }

    #[test]
    fn test_average_ignores_non_numeric() {
        assert_eq!(average_value(&json!({"a": 10, "b": "x", "c": 30})), 20);
        assert_eq!(average_value(&json!({"a": null, "b": [1, 2], "c": true})), 50);
    }

    #[test]
    fn test_average_of_non_object_is_neutral() {
        assert_eq!(average_value(&json!(null)), 50);
        assert_eq!(average_value(&json!("traits")), 50);
        assert_eq!(average_value(&json!([10, 20])), 50);
    }

    #[test]
    fn test_average_ignores_nan() {
        let traits: TraitSet = [("a", 40.0), ("b", f64::NAN), ("c", 60.0)]
            .into_iter()
            .collect();
        assert_eq!(average(&traits), 50);

        let only_nan: TraitSet = [("a", f64::NAN)].into_iter().collect();
        assert_eq!(average(&only_nan), 50);
    }

    #[test]
    fn test_average_rounds() {
        let traits: TraitSet = [("a", 10.0), ("b", 11.0)].into_iter().collect();
        assert_eq!(average(&traits), 11);
        let traits: TraitSet = [("a", 10.0), ("b", 10.2)].into_iter().collect();
        assert_eq!(average(&traits), 10);
        assert_eq!(traits.average(), 10);
    }

    #[test]
    fn test_from_value_keeps_finite_numbers() {
        let traits = TraitSet::from_value(&json!({"warmth": 70, "mood": "sunny", "openness": 55.5}));
        assert_eq!(traits.len(), 2);
        assert_eq!(traits.get("warmth"), Some(70.0));
        assert_eq!(traits.get("openness"), Some(55.5));
        assert!(TraitSet::from_value(&json!(3)).is_empty());
    }

    #[test]
    fn test_to_value_roundtrip_names() {
        let traits: TraitSet = [("openness", 50.0), ("warmth", 62.5)].into_iter().collect();
        let value = traits.to_value();
        assert_eq!(value, json!({"openness": 50.0, "warmth": 62.5}));
        assert!(TraitSet::from_value(&value).same_names(&traits));
    }

    #[test]
    fn test_non_finite_scores_are_dropped() {
        let traits: TraitSet = [("a", 40.0), ("b", f64::NAN), ("c", f64::INFINITY)]
            .into_iter()
            .collect();
        let expected: TraitSet = [("a", 40.0)].into_iter().collect();
        assert_eq!(traits.finite(), expected);
        assert_eq!(traits.to_value(), json!({"a": 40.0}));
    }

    #[test]
    fn test_serde_is_transparent() {
        let traits: TraitSet = serde_json::from_str(r#"{"warmth": 40}"#).unwrap();
        assert_eq!(traits.get("warmth"), Some(40.0));
        assert_eq!(serde_json::to_string(&traits).unwrap(), r#"{"warmth":40.0}"#);
    }
}
