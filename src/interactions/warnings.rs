//! Clinician-facing warning text for interaction findings.

use serde::{Deserialize, Serialize};

use crate::models::FindingSeverity;

use super::types::InteractionFinding;

const HIGH_SEVERITY_FOLLOW_UP_HOURS: u32 = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    Advisory,
    Caution,
    Warning,
    CriticalAlert,
}

impl WarningLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningLevel::Advisory => "advisory",
            WarningLevel::Caution => "caution",
            WarningLevel::Warning => "warning",
            WarningLevel::CriticalAlert => "critical_alert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionWarning {
    pub level: WarningLevel,
    pub headline: String,
    pub detail: String,
    pub actions: Vec<String>,
    pub monitoring: Vec<String>,
    pub follow_up_hours: Option<u32>,
}

/// Render a finding as an actionable warning. Fatal findings escalate to a
/// critical alert that forbids administration outright.
pub fn generate_interaction_warning(finding: &InteractionFinding) -> InteractionWarning {
    let pair = finding.drugs.join(" + ");
    match finding.severity {
        FindingSeverity::Fatal => InteractionWarning {
            level: WarningLevel::CriticalAlert,
            headline: "FATAL DRUG INTERACTION DETECTED".into(),
            detail: format!("{pair}: {}", finding.label),
            actions: vec![
                "do_not_administer".into(),
                "consult_physician_immediately".into(),
                "consider_alternative_therapy".into(),
            ],
            monitoring: finding.monitoring.clone(),
            follow_up_hours: None,
        },
        FindingSeverity::High => {
            let mut actions = Vec::new();
            if let Some(plan) = &finding.management {
                actions.push(plan.clone());
            }
            for item in &finding.monitoring {
                actions.push(format!("monitor_{item}"));
            }
            if finding.black_box {
                actions.push("review_black_box_warning".into());
            }
            InteractionWarning {
                level: WarningLevel::Warning,
                headline: format!("Serious interaction: {}", finding.label),
                detail: format!("{pair}: {}", finding.clinical_effects.join(", ")),
                actions,
                monitoring: finding.monitoring.clone(),
                follow_up_hours: Some(HIGH_SEVERITY_FOLLOW_UP_HOURS),
            }
        }
        FindingSeverity::Moderate => InteractionWarning {
            level: WarningLevel::Caution,
            headline: format!("Interaction requires monitoring: {}", finding.label),
            detail: format!("{pair}: {}", finding.clinical_effects.join(", ")),
            actions: finding.management.iter().cloned().collect(),
            monitoring: finding.monitoring.clone(),
            follow_up_hours: None,
        },
        FindingSeverity::Minor => InteractionWarning {
            level: WarningLevel::Advisory,
            headline: format!("Minor interaction: {}", finding.label),
            detail: pair,
            actions: finding.management.iter().cloned().collect(),
            monitoring: finding.monitoring.clone(),
            follow_up_hours: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::check_drug_interactions;
    use crate::models::MedicationProfile;
    use crate::reference::ReferenceData;

    fn finding_for(a: &str, b: &str) -> InteractionFinding {
        let reference = ReferenceData::load_test();
        check_drug_interactions(
            &[MedicationProfile::minimal(a, "")],
            &MedicationProfile::minimal(b, ""),
            &reference,
        )
        .unwrap()
        .remove(0)
    }

    /// T-01: a fatal finding renders as a critical alert that forbids
    /// administration.
    #[test]
    fn fatal_finding_renders_critical_alert() {
        let warning = generate_interaction_warning(&finding_for("phenelzine", "sertraline"));

        assert_eq!(warning.level, WarningLevel::CriticalAlert);
        assert_eq!(warning.headline, "FATAL DRUG INTERACTION DETECTED");
        assert_eq!(
            warning.actions,
            vec![
                "do_not_administer",
                "consult_physician_immediately",
                "consider_alternative_therapy",
            ]
        );
        assert!(warning.detail.contains("serotonin_syndrome"));
        assert_eq!(warning.follow_up_hours, None);
    }

    /// T-02: a high-severity finding carries concrete monitoring actions and
    /// a 72-hour follow-up window.
    #[test]
    fn high_finding_renders_warning_with_follow_up() {
        let warning = generate_interaction_warning(&finding_for("aspirin", "warfarin"));

        assert_eq!(warning.level, WarningLevel::Warning);
        assert_eq!(warning.follow_up_hours, Some(72));
        assert!(warning.actions.iter().any(|a| a.contains("INR")));
        assert!(warning.actions.iter().any(|a| a == "monitor_bleeding_signs"));
        assert!(warning.monitoring.contains(&"inr".to_string()));
    }

    #[test]
    fn moderate_finding_renders_caution() {
        let warning = generate_interaction_warning(&finding_for("warfarin", "simvastatin"));
        assert_eq!(warning.level, WarningLevel::Caution);
        assert!(warning.headline.contains("bleeding_risk_increase"));
        assert_eq!(warning.follow_up_hours, None);
    }

    #[test]
    fn minor_finding_renders_advisory() {
        let warning = generate_interaction_warning(&finding_for("aspirin", "ibuprofen"));
        assert_eq!(warning.level, WarningLevel::Advisory);
        assert!(!warning.actions.is_empty());
    }

    #[test]
    fn black_box_finding_adds_review_action() {
        let warning = generate_interaction_warning(&finding_for("morphine", "diazepam"));
        // Fatal outranks the black-box action set.
        assert_eq!(warning.level, WarningLevel::CriticalAlert);
    }
}
