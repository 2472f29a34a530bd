//! # A/B Assignment
//!
//! Uniform random variant per experiment, drawn once and persisted, with
//! monotonic impression and conversion counters keyed
//! `experiment:variant`.
//!
//! The RNG is injected so draws are reproducible under a seeded
//! generator.

use crate::PlaybookError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fewest variants an experiment may have.
pub const MIN_VARIANTS: u8 = 2;

/// Most variants an experiment may have (`A` to `Z`).
pub const MAX_VARIANTS: u8 = 26;

/// Letter of the variant at `index` (0 = `A`).
fn variant_letter(index: u8) -> String {
    char::from(b'A' + index).to_string()
}

fn variant_index(variant: &str) -> Option<u8> {
    match variant.as_bytes() {
        [b @ b'A'..=b'Z'] => Some(b - b'A'),
        _ => None,
    }
}

fn counter_key(experiment: &str, variant: &str) -> String {
    format!("{}:{}", experiment, variant)
}

// =============================================================================
// STATS
// =============================================================================

/// Counters of one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantStats {
    pub variant: String,
    pub impressions: u64,
    pub conversions: u64,
    /// Conversions per thousand impressions.
    pub conversion_per_mille: u64,
}

/// Counters of every variant seen for an experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentStats {
    pub experiment: String,
    pub assigned: Option<String>,
    pub variants: Vec<VariantStats>,
}

// =============================================================================
// STATE (persisted)
// =============================================================================

/// Assignments and counters for all experiments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentState {
    #[serde(default)]
    assignments: BTreeMap<String, String>,
    #[serde(default)]
    impressions: BTreeMap<String, u64>,
    #[serde(default)]
    conversions: BTreeMap<String, u64>,
}

impl ExperimentState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Variant for `experiment`, drawing and storing one on first use.
    ///
    /// A stored variant outside `variant_count` (the experiment shrank)
    /// is redrawn.
    pub fn assign(
        &mut self,
        experiment: &str,
        variant_count: u8,
        rng: &mut impl Rng,
    ) -> Result<String, PlaybookError> {
        validate_name(experiment)?;
        if !(MIN_VARIANTS..=MAX_VARIANTS).contains(&variant_count) {
            return Err(PlaybookError::InvalidInput(format!(
                "Variant count must be between {} and {}, got {}",
                MIN_VARIANTS, MAX_VARIANTS, variant_count
            )));
        }

        if let Some(existing) = self.assignments.get(experiment) {
            match variant_index(existing) {
                Some(i) if i < variant_count => return Ok(existing.clone()),
                _ => tracing::warn!(
                    experiment,
                    variant = %existing,
                    "stored variant out of range, redrawing"
                ),
            }
        }

        let variant = variant_letter(rng.gen_range(0..variant_count));
        self.assignments
            .insert(experiment.to_string(), variant.clone());
        tracing::debug!(experiment, variant = %variant, "variant assigned");
        Ok(variant)
    }

    /// Stored variant, if assigned.
    #[must_use]
    pub fn assigned(&self, experiment: &str) -> Option<&str> {
        self.assignments.get(experiment).map(String::as_str)
    }

    /// Count an impression of the assigned variant.
    pub fn record_impression(&mut self, experiment: &str) -> Result<u64, PlaybookError> {
        let key = self.assigned_key(experiment)?;
        Ok(bump(&mut self.impressions, key))
    }

    /// Count a conversion of the assigned variant.
    pub fn record_conversion(&mut self, experiment: &str) -> Result<u64, PlaybookError> {
        let key = self.assigned_key(experiment)?;
        Ok(bump(&mut self.conversions, key))
    }

    fn assigned_key(&self, experiment: &str) -> Result<String, PlaybookError> {
        self.assigned(experiment)
            .map(|variant| counter_key(experiment, variant))
            .ok_or_else(|| {
                PlaybookError::NotFound(format!("No variant assigned for '{}'", experiment))
            })
    }

    /// Per-variant counters of an experiment, in variant order.
    #[must_use]
    pub fn stats(&self, experiment: &str) -> ExperimentStats {
        let prefix = format!("{}:", experiment);
        let mut variants: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
        for (key, count) in &self.impressions {
            if let Some(variant) = key.strip_prefix(&prefix) {
                variants.entry(variant).or_default().0 = *count;
            }
        }
        for (key, count) in &self.conversions {
            if let Some(variant) = key.strip_prefix(&prefix) {
                variants.entry(variant).or_default().1 = *count;
            }
        }

        ExperimentStats {
            experiment: experiment.to_string(),
            assigned: self.assigned(experiment).map(str::to_string),
            variants: variants
                .into_iter()
                .map(|(variant, (impressions, conversions))| VariantStats {
                    variant: variant.to_string(),
                    impressions,
                    conversions,
                    conversion_per_mille: per_mille(conversions, impressions),
                })
                .collect(),
        }
    }

    /// Experiment names with an assignment.
    pub fn experiments(&self) -> impl Iterator<Item = &str> {
        self.assignments.keys().map(String::as_str)
    }
}

fn validate_name(experiment: &str) -> Result<(), PlaybookError> {
    if experiment.trim().is_empty() || experiment.contains(':') {
        return Err(PlaybookError::InvalidInput(format!(
            "Invalid experiment name '{}'",
            experiment
        )));
    }
    Ok(())
}

fn bump(counters: &mut BTreeMap<String, u64>, key: String) -> u64 {
    let count = counters.entry(key).or_insert(0);
    *count = count.saturating_add(1);
    *count
}

fn per_mille(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    part.saturating_mul(1000) / whole
}

// =============================================================================
// TESTS
// =============================================================================
