//! Pharmacokinetic projection of a detected interaction onto a measured
//! drug level.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::MedicationProfile;

use super::types::InteractionFinding;

/// Steady state is conventionally reached after five half-lives.
const STEADY_STATE_HALF_LIVES: f64 = 5.0;

/// Projected effect of an interaction on the affected (substrate) drug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomePrediction {
    pub drugs: Vec<String>,
    /// Substrate level after the interaction reaches steady state, in the
    /// unit the level was supplied in.
    pub predicted_level: f64,
    pub exposure_multiplier: f64,
    pub exceeds_therapeutic_max: bool,
    /// 0.0–0.95; at or above the toxic threshold this is at least 0.7.
    pub toxicity_probability: f64,
    pub time_to_steady_state_hours: Option<f64>,
    pub recommendation: String,
}

/// Project a finding onto the substrate's current level.
///
/// Mechanisms without an exposure multiplier (pure pharmacodynamic
/// interactions) leave the level unchanged; the risk then lies in the
/// combined effect, not the concentration.
pub fn predict_interaction_outcome(
    finding: &InteractionFinding,
    substrate_level: f64,
    substrate: &MedicationProfile,
) -> OutcomePrediction {
    let multiplier = finding.exposure_multiplier.unwrap_or(1.0);
    let predicted_level = substrate_level * multiplier;

    let time_to_steady_state_hours = (substrate.half_life_hours > 0.0)
        .then(|| substrate.half_life_hours * STEADY_STATE_HALF_LIVES);

    let (exceeds_therapeutic_max, toxicity_probability) = match &substrate.therapeutic_range {
        Some(range) => {
            let exceeds = predicted_level > range.max;
            let probability = if predicted_level >= range.toxic {
                // Saturates well below certainty; levels are estimates.
                (0.7 + 0.25 * (predicted_level / range.toxic - 1.0)).min(0.95)
            } else if exceeds {
                0.2 + 0.5 * (predicted_level - range.max) / (range.toxic - range.max)
            } else if multiplier > 1.0 {
                0.2
            } else {
                0.05
            };
            (exceeds, probability)
        }
        None => (false, if multiplier > 1.0 { 0.2 } else { 0.05 }),
    };

    let recommendation = match finding.management.clone() {
        Some(plan) => plan,
        None if toxicity_probability >= 0.7 => {
            "Reduce substrate dose or avoid the combination; recheck levels".to_string()
        }
        None if exceeds_therapeutic_max => "Monitor substrate levels closely".to_string(),
        None => "No dose change required; monitor clinically".to_string(),
    };

    debug!(
        substrate = %substrate.name,
        predicted_level,
        toxicity_probability,
        "interaction outcome projected",
    );

    OutcomePrediction {
        drugs: finding.drugs.clone(),
        predicted_level,
        exposure_multiplier: multiplier,
        exceeds_therapeutic_max,
        toxicity_probability,
        time_to_steady_state_hours,
        recommendation,
    }
}
