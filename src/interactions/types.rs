use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::FindingSeverity;
use crate::reference::interactions::{
    ClassInteractionRule, InteractionMechanism, InteractionRule, Onset,
};

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("Medication entry has no usable identifier")]
    MissingIdentifier,
}

/// One detected interaction. Names are stored lowercased, existing
/// medication first, so findings dedupe on the unordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionFinding {
    pub drugs: Vec<String>,
    pub severity: FindingSeverity,
    /// Short label, e.g. "bleeding_risk", "serotonin_syndrome".
    pub label: String,
    /// Mechanism label, e.g. "enzyme_inhibition".
    pub mechanism: String,
    pub clinical_effects: Vec<String>,
    pub onset: Onset,
    pub monitoring: Vec<String>,
    pub management: Option<String>,
    /// Expected exposure multiplier for the affected drug, where the
    /// mechanism implies one (enzyme or transporter inhibition).
    pub exposure_multiplier: Option<f64>,
    pub black_box: bool,
    pub contraindicated: bool,
    /// Fatal findings can never be overridden, by anyone.
    pub override_allowed: bool,
}

impl InteractionFinding {
    pub(crate) fn from_pair_rule(rule: &InteractionRule, existing: &str, proposed: &str) -> Self {
        Self::from_parts(
            existing,
            proposed,
            rule.severity,
            rule.label.clone(),
            &rule.mechanism,
            rule.clinical_effects.clone(),
            rule.onset,
            rule.monitoring.clone(),
            rule.management.clone(),
            rule.black_box,
        )
    }

    pub(crate) fn from_class_rule(
        rule: &ClassInteractionRule,
        existing: &str,
        proposed: &str,
    ) -> Self {
        Self::from_parts(
            existing,
            proposed,
            rule.severity,
            rule.label.clone(),
            &rule.mechanism,
            rule.clinical_effects.clone(),
            rule.onset,
            rule.monitoring.clone(),
            rule.management.clone(),
            rule.black_box,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn from_parts(
        existing: &str,
        proposed: &str,
        severity: FindingSeverity,
        label: String,
        mechanism: &InteractionMechanism,
        clinical_effects: Vec<String>,
        onset: Onset,
        monitoring: Vec<String>,
        management: Option<String>,
        black_box: bool,
    ) -> Self {
        let fatal = severity == FindingSeverity::Fatal;
        Self {
            drugs: vec![existing.to_lowercase(), proposed.to_lowercase()],
            severity,
            label,
            mechanism: mechanism.label().to_string(),
            clinical_effects,
            onset,
            monitoring,
            management,
            exposure_multiplier: mechanism.exposure_multiplier(),
            black_box,
            contraindicated: fatal,
            override_allowed: !fatal,
        }
    }

    pub fn involves(&self, drug: &str) -> bool {
        self.drugs.iter().any(|d| d.eq_ignore_ascii_case(drug))
    }

    /// Unordered pair key used to drop duplicate findings for the same two
    /// drugs.
    pub(crate) fn drug_set_key(&self) -> (String, String) {
        let mut pair: Vec<String> = self.drugs.iter().map(|d| d.to_lowercase()).collect();
        pair.sort();
        let second = pair.get(1).cloned().unwrap_or_default();
        (pair.swap_remove(0), second)
    }
}

/// Verdict on a whole medication list. A single fatal finding vetoes the
/// combination with no override path; anything less is approved with the
/// combined monitoring burden attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationReport {
    pub id: Uuid,
    pub approved: bool,
    pub reason: Option<String>,
    pub allow_physician_override: bool,
    pub findings: Vec<InteractionFinding>,
    pub monitoring_required: Vec<String>,
}
