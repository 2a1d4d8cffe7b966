use serde::{Deserialize, Serialize};

/// Therapeutic window for a medication, in the stated unit.
/// `toxic` is the level above which a computed dose is invalid outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapeuticRange {
    pub min: f64,
    pub max: f64,
    pub toxic: f64,
    pub unit: String,
}

impl TherapeuticRange {
    pub fn contains(&self, dose: f64) -> bool {
        dose >= self.min && dose <= self.max
    }
}

/// Pharmacological profile of a medication, as supplied by the caller's
/// formulary. Interaction screening reads `interacting_drugs` directly so
/// that detection stays O(current medications) per check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationProfile {
    pub name: String,
    pub drug_class: String,
    pub mechanism_of_action: String,
    pub metabolic_pathways: Vec<String>,
    pub protein_binding_pct: f64,
    pub half_life_hours: f64,
    pub therapeutic_range: Option<TherapeuticRange>,
    pub interacting_drugs: Vec<String>,
    pub contraindicated_conditions: Vec<String>,
}

impl MedicationProfile {
    /// Profile carrying only identity and class, for callers that know the
    /// drug name but not its full pharmacology (e.g. a medication list of
    /// bare names). Rule lookups work off name and class alone.
    pub fn minimal(name: impl Into<String>, drug_class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            drug_class: drug_class.into(),
            mechanism_of_action: String::new(),
            metabolic_pathways: Vec::new(),
            protein_binding_pct: 0.0,
            half_life_hours: 0.0,
            therapeutic_range: None,
            interacting_drugs: Vec::new(),
            contraindicated_conditions: Vec::new(),
        }
    }

    /// Case-insensitive membership test against the interacting-drug set.
    pub fn interacts_with(&self, other: &str) -> bool {
        let lower = other.to_lowercase();
        self.interacting_drugs.iter().any(|d| d.to_lowercase() == lower)
    }

    /// Whether both drugs share a metabolic pathway (e.g. "CYP2C9").
    pub fn shares_pathway(&self, other: &MedicationProfile) -> bool {
        self.metabolic_pathways.iter().any(|p| {
            other
                .metabolic_pathways
                .iter()
                .any(|q| q.eq_ignore_ascii_case(p))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warfarin() -> MedicationProfile {
        MedicationProfile {
            name: "warfarin".into(),
            drug_class: "anticoagulant".into(),
            mechanism_of_action: "vitamin_k_antagonist".into(),
            metabolic_pathways: vec!["CYP2C9".into(), "CYP1A2".into(), "CYP3A4".into()],
            protein_binding_pct: 99.0,
            half_life_hours: 36.0,
            therapeutic_range: Some(TherapeuticRange {
                min: 2.0,
                max: 10.0,
                toxic: 15.0,
                unit: "mg".into(),
            }),
            interacting_drugs: vec!["aspirin".into(), "fluconazole".into()],
            contraindicated_conditions: vec!["active_bleeding".into()],
        }
    }

    #[test]
    fn interaction_membership_case_insensitive() {
        let w = warfarin();
        assert!(w.interacts_with("Aspirin"));
        assert!(!w.interacts_with("metformin"));
    }

    #[test]
    fn shared_pathway_detected() {
        let w = warfarin();
        let mut other = warfarin();
        other.name = "fluconazole".into();
        other.metabolic_pathways = vec!["cyp2c9".into()];
        assert!(w.shares_pathway(&other));
    }

    #[test]
    fn therapeutic_range_contains() {
        let range = warfarin().therapeutic_range.unwrap();
        assert!(range.contains(5.0));
        assert!(!range.contains(12.0));
    }
}
