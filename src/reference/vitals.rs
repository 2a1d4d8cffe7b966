use serde::{Deserialize, Serialize};

use crate::models::{ConditionSeverity, PatientDemographics};

/// Classification band for one vital parameter. Thresholds are read in
/// order: below `critical_low` and at/above `critical_high` classify as
/// critical; `low..=high` is the normal range; `high..=elevated_high` is the
/// borderline band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalBand {
    pub critical_low: f64,
    pub low: f64,
    pub high: f64,
    pub elevated_high: f64,
    pub critical_high: f64,
}

/// A complete set of bands for one population. Selection is most-specific
/// first: pregnancy, then neonatal weight, then age range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalBandSet {
    pub label: String,
    pub age_min_years: u32,
    pub age_max_years: u32,
    pub pregnancy: bool,
    /// Neonatal band selection is weight-based.
    pub weight_max_kg: Option<f64>,
    pub systolic: VitalBand,
    pub diastolic: VitalBand,
    pub heart_rate: VitalBand,
    pub respiratory_rate: VitalBand,
    pub temperature: VitalBand,
    pub oxygen_saturation: VitalBand,
}

/// Clinical response knowledge for a named emergency condition. The trigger
/// predicates live in the validator; everything a caller must *do* about the
/// condition lives here so it can be updated without code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyRule {
    pub condition: String,
    pub severity: ConditionSeverity,
    pub time_to_intervention: String,
    pub interventions: Vec<String>,
    pub complications: Vec<String>,
    pub possible_causes: Vec<String>,
}

/// The vital-signs knowledge table of a reference snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalReference {
    pub bands: Vec<VitalBandSet>,
    pub emergencies: Vec<EmergencyRule>,
}

impl VitalReference {
    /// Select the band set for a patient. Pregnancy bands take precedence,
    /// then neonatal weight bands, then the narrowest matching age range.
    pub fn select_band(&self, demographics: &PatientDemographics) -> Option<&VitalBandSet> {
        let age = demographics.age_years;

        if demographics.pregnant {
            if let Some(band) = self
                .bands
                .iter()
                .find(|b| b.pregnancy && (b.age_min_years..=b.age_max_years).contains(&age))
            {
                return Some(band);
            }
        }

        if let Some(weight) = demographics.weight_kg {
            if let Some(band) = self.bands.iter().find(|b| {
                !b.pregnancy
                    && b.weight_max_kg.is_some_and(|max| weight <= max)
                    && (b.age_min_years..=b.age_max_years).contains(&age)
            }) {
                return Some(band);
            }
        }

        self.bands
            .iter()
            .filter(|b| !b.pregnancy && b.weight_max_kg.is_none())
            .filter(|b| (b.age_min_years..=b.age_max_years).contains(&age))
            .min_by_key(|b| b.age_max_years - b.age_min_years)
    }

    pub fn emergency(&self, condition: &str) -> Option<&EmergencyRule> {
        self.emergencies.iter().find(|e| e.condition == condition)
    }
}
