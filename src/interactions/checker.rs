//! Interaction screening over the reference snapshot.
//!
//! Pair rules are matched through the snapshot's name index, class rules
//! against the effective drug class (profile class, falling back to the
//! dosing table's family membership), and formulary-declared interactions
//! are surfaced even without a snapshot rule. Findings dedupe on the
//! unordered drug pair, keeping the most severe, and sort by descending
//! severity.

use std::collections::HashSet;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{FindingSeverity, MedicationProfile, PatientProfile};
use crate::reference::interactions::Onset;
use crate::reference::ReferenceData;

use super::types::{CombinationReport, InteractionError, InteractionFinding};

/// Screen one proposed medication against the patient's current list.
pub fn check_drug_interactions(
    current: &[MedicationProfile],
    proposed: &MedicationProfile,
    reference: &ReferenceData,
) -> Result<Vec<InteractionFinding>, InteractionError> {
    if proposed.name.trim().is_empty() {
        return Err(InteractionError::MissingIdentifier);
    }

    let mut findings = Vec::new();
    for existing in current {
        if existing.name.trim().is_empty() {
            return Err(InteractionError::MissingIdentifier);
        }
        screen_pair(existing, proposed, reference, &mut findings);
    }
    dedup_and_sort(&mut findings);

    if let Some(fatal) = findings.iter().find(|f| f.severity == FindingSeverity::Fatal) {
        warn!(
            proposed = %proposed.name,
            drugs = ?fatal.drugs,
            interaction = %fatal.label,
            "fatal interaction detected",
        );
    } else {
        debug!(
            proposed = %proposed.name,
            finding_count = findings.len(),
            "interaction screen complete",
        );
    }
    Ok(findings)
}

/// All-pairs analysis of a medication list, used at order review.
pub fn analyze_drug_combination(
    medications: &[MedicationProfile],
    reference: &ReferenceData,
) -> Result<Vec<InteractionFinding>, InteractionError> {
    if medications.iter().any(|m| m.name.trim().is_empty()) {
        return Err(InteractionError::MissingIdentifier);
    }

    let mut findings = Vec::new();
    for (i, a) in medications.iter().enumerate() {
        for b in &medications[i + 1..] {
            screen_pair(a, b, reference, &mut findings);
        }
    }
    dedup_and_sort(&mut findings);
    Ok(findings)
}

/// Severity of the known interaction between two drugs, if any. Brand names
/// are resolved before lookup.
pub fn get_interaction_severity(
    a: &str,
    b: &str,
    reference: &ReferenceData,
) -> Option<FindingSeverity> {
    let generic_a = reference.dosing.resolve_generic(a);
    let generic_b = reference.dosing.resolve_generic(b);
    if let Some(rule) = reference.interactions.pair_rule(&generic_a, &generic_b) {
        return Some(rule.severity);
    }
    let class_a = reference.dosing.drug_class_of(&generic_a)?;
    let class_b = reference.dosing.drug_class_of(&generic_b)?;
    reference
        .interactions
        .class_rule(&class_a, &class_b)
        .map(|r| r.severity)
}

/// Absolute drug-condition contraindications and allergy matches for one
/// medication against a patient. These findings are never overridable.
pub fn check_contraindications(
    medication: &MedicationProfile,
    patient: &PatientProfile,
    reference: &ReferenceData,
) -> Vec<InteractionFinding> {
    let generic = reference.dosing.resolve_generic(&medication.name);
    let mut findings = Vec::new();

    for contra in reference.interactions.contraindications_for(&generic) {
        if patient.has_condition(&contra.condition) {
            findings.push(absolute_finding(
                &generic,
                &contra.condition,
                Some(contra.reason.clone()),
            ));
        }
    }
    for condition in &medication.contraindicated_conditions {
        let already = findings
            .iter()
            .any(|f| f.label == condition_label(condition));
        if !already && patient.has_condition(condition) {
            findings.push(absolute_finding(&generic, condition, None));
        }
    }
    for allergen in &patient.allergies {
        let direct = allergen.eq_ignore_ascii_case(&generic);
        let family = reference.dosing.shared_family(&generic, allergen).is_some();
        if direct || family {
            findings.push(InteractionFinding {
                drugs: vec![generic.clone()],
                severity: FindingSeverity::High,
                label: "allergy_match".into(),
                mechanism: "hypersensitivity".into(),
                clinical_effects: vec!["allergic_reaction".into(), "anaphylaxis".into()],
                onset: Onset::Immediate,
                monitoring: Vec::new(),
                management: Some(format!("Documented allergy to {allergen}")),
                exposure_multiplier: None,
                black_box: false,
                contraindicated: true,
                override_allowed: false,
            });
        }
    }

    if !findings.is_empty() {
        warn!(
            medication = %generic,
            finding_count = findings.len(),
            "contraindications found",
        );
    }
    findings
}

/// Approve or veto a whole medication list. Any fatal finding vetoes it
/// without an override path; otherwise the list is approved carrying the
/// combined monitoring requirements.
pub fn validate_drug_combination(
    medications: &[MedicationProfile],
    reference: &ReferenceData,
) -> Result<CombinationReport, InteractionError> {
    let findings = analyze_drug_combination(medications, reference)?;

    let mut monitoring: Vec<String> = Vec::new();
    for finding in &findings {
        for item in &finding.monitoring {
            if !monitoring.contains(item) {
                monitoring.push(item.clone());
            }
        }
    }

    let fatal = findings.iter().any(|f| f.severity == FindingSeverity::Fatal);
    if fatal {
        warn!(
            medication_count = medications.len(),
            "combination vetoed on fatal interaction",
        );
        return Ok(CombinationReport {
            id: Uuid::new_v4(),
            approved: false,
            reason: Some("fatal_interaction_detected".into()),
            allow_physician_override: false,
            findings,
            monitoring_required: monitoring,
        });
    }

    let high = findings.iter().any(|f| f.severity == FindingSeverity::High);
    Ok(CombinationReport {
        id: Uuid::new_v4(),
        approved: true,
        reason: high.then(|| "high_severity_interactions_present".to_string()),
        allow_physician_override: true,
        findings,
        monitoring_required: monitoring,
    })
}

// ---------------------------------------------------------------------------
// Matching internals
// ---------------------------------------------------------------------------

fn screen_pair(
    existing: &MedicationProfile,
    proposed: &MedicationProfile,
    reference: &ReferenceData,
    findings: &mut Vec<InteractionFinding>,
) {
    let existing_name = reference.dosing.resolve_generic(&existing.name);
    let proposed_name = reference.dosing.resolve_generic(&proposed.name);
    if existing_name.eq_ignore_ascii_case(&proposed_name) {
        return;
    }

    let mut matched = false;
    if let Some(rule) = reference
        .interactions
        .pair_rule(&existing_name, &proposed_name)
    {
        findings.push(InteractionFinding::from_pair_rule(
            rule,
            &existing_name,
            &proposed_name,
        ));
        matched = true;
    }

    let class_a = effective_class(existing, &existing_name, reference);
    let class_b = effective_class(proposed, &proposed_name, reference);
    if !class_a.is_empty() && !class_b.is_empty() {
        if let Some(rule) = reference.interactions.class_rule(&class_a, &class_b) {
            findings.push(InteractionFinding::from_class_rule(
                rule,
                &existing_name,
                &proposed_name,
            ));
            matched = true;
        }
    }

    // Formulary-declared interactions without a snapshot rule still warrant
    // review.
    if !matched
        && (existing.interacts_with(&proposed_name) || proposed.interacts_with(&existing_name))
    {
        findings.push(InteractionFinding {
            drugs: vec![existing_name, proposed_name],
            severity: FindingSeverity::Moderate,
            label: "formulary_flagged".into(),
            mechanism: "formulary_declared".into(),
            clinical_effects: Vec::new(),
            onset: Onset::Delayed,
            monitoring: Vec::new(),
            management: Some("Interaction declared by formulary; review combination".into()),
            exposure_multiplier: None,
            black_box: false,
            contraindicated: false,
            override_allowed: true,
        });
    }
}

/// Profile class when supplied, else the dosing table's class or family.
fn effective_class(
    medication: &MedicationProfile,
    generic_name: &str,
    reference: &ReferenceData,
) -> String {
    if !medication.drug_class.trim().is_empty() {
        return medication.drug_class.clone();
    }
    reference
        .dosing
        .drug_class_of(generic_name)
        .unwrap_or_default()
}

fn condition_label(condition: &str) -> String {
    format!("contraindicated_in_{condition}")
}

fn absolute_finding(
    generic: &str,
    condition: &str,
    reason: Option<String>,
) -> InteractionFinding {
    InteractionFinding {
        drugs: vec![generic.to_string()],
        severity: FindingSeverity::High,
        label: condition_label(condition),
        mechanism: "condition_contraindication".into(),
        clinical_effects: Vec::new(),
        onset: Onset::Immediate,
        monitoring: Vec::new(),
        management: reason,
        exposure_multiplier: None,
        black_box: false,
        contraindicated: true,
        override_allowed: false,
    }
}

fn dedup_and_sort(findings: &mut Vec<InteractionFinding>) {
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    let mut seen: HashSet<(String, String)> = HashSet::new();
    findings.retain(|f| seen.insert(f.drug_set_key()));
}
