//! Manual simulation harness.
//!
//! Feeds a scripted sequence of `{emotion?, text}` steps through a
//! [`PersonalityPipeline`] and tabulates how the traits evolve. Steps without
//! an explicit emotion are classified from their text.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::emotion::{Emotion, LanguageHint};
use crate::personality::{average, PersonalityPipeline, TraitSet};
use crate::utilities::errors::ConfigError;

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStep {
    #[serde(default)]
    pub emotion: Option<Emotion>,
    #[serde(default)]
    pub text: String,
}

impl SimulationStep {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            emotion: None,
            text: text.into(),
        }
    }

    pub fn with_emotion(emotion: Emotion, text: impl Into<String>) -> Self {
        Self {
            emotion: Some(emotion),
            text: text.into(),
        }
    }
}

/// State after one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRow {
    /// 1-based step number.
    pub step: usize,
    pub text: String,
    pub emotion: Emotion,
    /// Last known traits; unchanged when the update was skipped.
    pub traits: TraitSet,
    pub average: i64,
    /// Whether the pipeline persisted an update for this step.
    pub applied: bool,
}

/// Load steps from a JSON or YAML (`.yaml`/`.yml`) list.
pub fn load_steps(path: impl AsRef<Path>) -> Result<Vec<SimulationStep>, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        _ => Ok(serde_json::from_str(&content)?),
    }
}

/// Drives a pipeline through scripted steps.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    character_id: Option<String>,
    hint: LanguageHint,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Character to update; the pipeline default when unset.
    pub fn with_character(mut self, character_id: impl Into<String>) -> Self {
        self.character_id = Some(character_id.into());
        self
    }

    pub fn with_hint(mut self, hint: LanguageHint) -> Self {
        self.hint = hint;
        self
    }

    /// Run every step in order and collect one row per step.
    pub async fn run(
        &self,
        pipeline: &PersonalityPipeline,
        steps: &[SimulationStep],
    ) -> Vec<SimulationRow> {
        let character_id = self.character_id.as_deref();
        let mut last_known = pipeline
            .current_traits(character_id)
            .await
            .unwrap_or_default();
        let mut rows = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let emotion = step
                .emotion
                .unwrap_or_else(|| pipeline.classifier().classify(&step.text, self.hint));
            let updated = pipeline
                .update_from_emotion(emotion, &step.text, character_id)
                .await;
            let applied = updated.is_some();
            if let Some(traits) = updated {
                last_known = traits;
            }
            log::debug!(
                "[Simulation] Step {}: '{}' -> {} (applied: {})",
                index + 1,
                step.text,
                emotion,
                applied
            );
            rows.push(SimulationRow {
                step: index + 1,
                text: step.text.clone(),
                emotion,
                average: average(&last_known),
                traits: last_known.clone(),
                applied,
            });
        }
        rows
    }
}

/// Render rows as an aligned plain-text table with one column per trait.
pub fn render_table(rows: &[SimulationRow]) -> String {
    let trait_names: BTreeSet<&str> = rows.iter().flat_map(|row| row.traits.names()).collect();

    let mut header: Vec<String> = vec!["step".into(), "emotion".into()];
    header.extend(trait_names.iter().map(|name| name.to_string()));
    header.push("avg".into());
    header.push("text".into());

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.step.to_string(), row.emotion.to_string()];
            cells.extend(trait_names.iter().map(|name| match row.traits.get(name) {
                Some(score) => format!("{:.2}", score),
                None => "-".to_string(),
            }));
            let marker = if row.applied { "" } else { "*" };
            cells.push(format!("{}{}", row.average, marker));
            cells.push(row.text.clone());
            cells
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for cells in &body {
        push_line(&mut out, cells, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let last = cells.len().saturating_sub(1);
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            // The trailing text column is left unpadded.
            if i == last {
                cell.clone()
            } else {
                let pad = width.saturating_sub(cell.chars().count());
                format!("{}{}", cell, " ".repeat(pad))
            }
        })
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}
