use tracing::warn;

use crate::models::{AgeClass, PatientDemographics, VitalSigns};
use crate::reference::ReferenceData;

use super::types::EmergencyFinding;
use super::validator::mean_arterial_pressure;

// Combination thresholds for the named emergencies. Response knowledge
// (severity, interventions, complications) lives in the reference snapshot;
// only the trigger predicates are code.
const CRISIS_SYSTOLIC: f64 = 180.0;
const CRISIS_DIASTOLIC: f64 = 120.0;
const SHOCK_SYSTOLIC: f64 = 90.0;
const SHOCK_MAP: f64 = 65.0;
const HYPOXEMIA_SPO2: f64 = 90.0;
const DEPRESSION_RESPIRATORY_RATE: f64 = 8.0;
const TACHYCARDIA_HEART_RATE: f64 = 150.0;
const BRADYCARDIA_HEART_RATE: f64 = 40.0;
const HYPERTHERMIA_TEMPERATURE: f64 = 42.0;
const HYPOTHERMIA_TEMPERATURE: f64 = 32.0;
const PREECLAMPSIA_RISK_SYSTOLIC: f64 = 140.0;
const PREECLAMPSIA_RISK_DIASTOLIC: f64 = 90.0;
const PREECLAMPSIA_SEVERE_SYSTOLIC: f64 = 160.0;
const PREECLAMPSIA_SEVERE_DIASTOLIC: f64 = 110.0;

/// Derive named emergency conditions from threshold combinations, ordered
/// most severe first. Absent vitals simply skip their checks; plausibility
/// is the validator's job.
pub fn detect_emergency_conditions(
    vitals: &VitalSigns,
    demographics: &PatientDemographics,
    reference: &ReferenceData,
) -> Vec<EmergencyFinding> {
    let mut findings = Vec::new();

    // -----------------------------------------------------------------------
    // [1] Pressure combinations
    // -----------------------------------------------------------------------
    if let (Some(systolic), Some(diastolic)) = (vitals.systolic_bp, vitals.diastolic_bp) {
        if systolic >= CRISIS_SYSTOLIC && diastolic >= CRISIS_DIASTOLIC {
            push_finding(
                &mut findings,
                reference,
                "hypertensive_crisis",
                format!("blood pressure {systolic:.0}/{diastolic:.0} mmHg"),
            );
        }
        let map = mean_arterial_pressure(systolic, diastolic);
        if systolic < SHOCK_SYSTOLIC && map < SHOCK_MAP {
            push_finding(
                &mut findings,
                reference,
                "hypotensive_shock",
                format!(
                    "systolic {systolic:.0} mmHg with mean arterial pressure {map:.0} mmHg"
                ),
            );
        }
    }

    // -----------------------------------------------------------------------
    // [2] Single-parameter thresholds
    // -----------------------------------------------------------------------
    if let Some(spo2) = vitals.oxygen_saturation {
        if spo2 < HYPOXEMIA_SPO2 {
            push_finding(
                &mut findings,
                reference,
                "severe_hypoxemia",
                format!("oxygen saturation {spo2:.0}%"),
            );
        }
    }
    if let Some(rate) = vitals.respiratory_rate {
        if rate < DEPRESSION_RESPIRATORY_RATE {
            push_finding(
                &mut findings,
                reference,
                "respiratory_depression",
                format!("respiratory rate {rate:.0}/min"),
            );
        }
    }
    if let Some(rate) = vitals.heart_rate {
        if rate > TACHYCARDIA_HEART_RATE {
            push_finding(
                &mut findings,
                reference,
                "severe_tachycardia",
                format!("heart rate {rate:.0} bpm"),
            );
        }
        if rate < BRADYCARDIA_HEART_RATE {
            push_finding(
                &mut findings,
                reference,
                "severe_bradycardia",
                format!("heart rate {rate:.0} bpm"),
            );
        }
    }
    if let Some(temperature) = vitals.temperature_c {
        if temperature > HYPERTHERMIA_TEMPERATURE {
            push_finding(
                &mut findings,
                reference,
                "malignant_hyperthermia",
                format!("temperature {temperature:.1} °C"),
            );
        }
        if temperature < HYPOTHERMIA_TEMPERATURE {
            push_finding(
                &mut findings,
                reference,
                "severe_hypothermia",
                format!("temperature {temperature:.1} °C"),
            );
        }
    }

    // -----------------------------------------------------------------------
    // [3] Pregnancy
    // -----------------------------------------------------------------------
    if demographics.pregnant {
        if let (Some(systolic), Some(diastolic)) = (vitals.systolic_bp, vitals.diastolic_bp) {
            if systolic >= PREECLAMPSIA_RISK_SYSTOLIC || diastolic >= PREECLAMPSIA_RISK_DIASTOLIC {
                let severe = systolic >= PREECLAMPSIA_SEVERE_SYSTOLIC
                    || diastolic >= PREECLAMPSIA_SEVERE_DIASTOLIC
                    || demographics
                        .known_conditions
                        .iter()
                        .any(|c| c.eq_ignore_ascii_case("proteinuria"));
                let condition = if severe { "preeclampsia" } else { "preeclampsia_risk" };
                push_finding(
                    &mut findings,
                    reference,
                    condition,
                    format!("blood pressure {systolic:.0}/{diastolic:.0} mmHg in pregnancy"),
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // [4] Pediatric combination, thresholds from the age band
    // -----------------------------------------------------------------------
    if demographics.age_class() == AgeClass::Pediatric {
        if let Some(band) = reference.vitals.select_band(demographics) {
            if let (Some(systolic), Some(heart_rate), Some(temperature)) =
                (vitals.systolic_bp, vitals.heart_rate, vitals.temperature_c)
            {
                if systolic < band.systolic.low
                    && heart_rate > band.heart_rate.elevated_high
                    && temperature > band.temperature.elevated_high
                {
                    push_finding(
                        &mut findings,
                        reference,
                        "pediatric_septic_shock",
                        format!(
                            "hypotension ({systolic:.0} mmHg) with tachycardia \
                             ({heart_rate:.0} bpm) and fever ({temperature:.1} °C) \
                             for the {} band",
                            band.label
                        ),
                    );
                }
            }
        }
    }

    findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    findings
}

fn push_finding(
    findings: &mut Vec<EmergencyFinding>,
    reference: &ReferenceData,
    condition: &str,
    trigger: String,
) {
    match reference.vitals.emergency(condition) {
        Some(rule) => findings.push(EmergencyFinding::from_rule(rule, trigger)),
        None => warn!(condition, "emergency response rule missing from reference snapshot"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::models::{ConditionSeverity, ConsciousnessLevel, Sex};

    use super::*;

    fn at_noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 12)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn snapshot(
        systolic: f64,
        diastolic: f64,
        heart_rate: f64,
        respiratory_rate: f64,
        temperature: f64,
        spo2: f64,
    ) -> VitalSigns {
        VitalSigns {
            recorded_at: at_noon(),
            systolic_bp: Some(systolic),
            diastolic_bp: Some(diastolic),
            heart_rate: Some(heart_rate),
            respiratory_rate: Some(respiratory_rate),
            temperature_c: Some(temperature),
            oxygen_saturation: Some(spo2),
            pain_score: None,
            consciousness: Some(ConsciousnessLevel::Alert),
        }
    }

    fn adult() -> PatientDemographics {
        PatientDemographics::adult(35, Sex::Male)
    }

    fn find<'a>(findings: &'a [EmergencyFinding], condition: &str) -> &'a EmergencyFinding {
        findings
            .iter()
            .find(|f| f.condition == condition)
            .unwrap_or_else(|| panic!("expected finding {condition}"))
    }

    /// T-01: low saturation and a depressed respiratory rate each produce
    /// their own finding with response knowledge from the snapshot.
    #[test]
    fn hypoxemia_and_respiratory_depression() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(118.0, 76.0, 88.0, 6.0, 36.8, 89.0);

        let findings = detect_emergency_conditions(&vitals, &adult(), &reference);
        let hypoxemia = find(&findings, "severe_hypoxemia");
        assert_eq!(hypoxemia.severity, ConditionSeverity::Critical);
        assert!(hypoxemia.trigger.contains("89"));

        let depression = find(&findings, "respiratory_depression");
        assert!(depression
            .interventions
            .contains(&"naloxone_if_opioid_induced".to_string()));
    }

    #[test]
    fn heart_rate_extremes() {
        let reference = ReferenceData::load_test();

        let fast = snapshot(118.0, 76.0, 155.0, 16.0, 36.8, 97.0);
        let findings = detect_emergency_conditions(&fast, &adult(), &reference);
        let tachycardia = find(&findings, "severe_tachycardia");
        assert_eq!(tachycardia.severity, ConditionSeverity::High);
        assert_eq!(tachycardia.time_to_intervention, "within_30_minutes");

        let slow = snapshot(118.0, 76.0, 38.0, 16.0, 36.8, 97.0);
        let findings = detect_emergency_conditions(&slow, &adult(), &reference);
        let bradycardia = find(&findings, "severe_bradycardia");
        assert!(bradycardia.interventions.contains(&"atropine".to_string()));
    }

    #[test]
    fn temperature_extremes() {
        let reference = ReferenceData::load_test();

        let hot = snapshot(118.0, 76.0, 110.0, 22.0, 42.5, 97.0);
        let findings = detect_emergency_conditions(&hot, &adult(), &reference);
        let hyperthermia = find(&findings, "malignant_hyperthermia");
        assert_eq!(hyperthermia.severity, ConditionSeverity::LifeThreatening);
        assert!(hyperthermia.interventions.contains(&"dantrolene".to_string()));

        let cold = snapshot(118.0, 76.0, 55.0, 12.0, 31.0, 97.0);
        let findings = detect_emergency_conditions(&cold, &adult(), &reference);
        assert_eq!(
            find(&findings, "severe_hypothermia").severity,
            ConditionSeverity::LifeThreatening
        );
    }

    /// T-02: pregnancy hypertension escalates from risk to preeclampsia on
    /// severe pressures or proteinuria.
    #[test]
    fn preeclampsia_tiers() {
        let reference = ReferenceData::load_test();
        let mut pregnant = PatientDemographics::adult(28, Sex::Female);
        pregnant.pregnant = true;
        pregnant.gestational_trimester = Some(3);

        let mild = snapshot(145.0, 88.0, 92.0, 18.0, 36.8, 97.0);
        let findings = detect_emergency_conditions(&mild, &pregnant, &reference);
        assert_eq!(
            find(&findings, "preeclampsia_risk").severity,
            ConditionSeverity::High
        );
        assert!(!findings.iter().any(|f| f.condition == "preeclampsia"));

        let severe = snapshot(165.0, 95.0, 92.0, 18.0, 36.8, 97.0);
        let findings = detect_emergency_conditions(&severe, &pregnant, &reference);
        let preeclampsia = find(&findings, "preeclampsia");
        assert!(preeclampsia
            .interventions
            .contains(&"magnesium_sulfate".to_string()));

        pregnant.known_conditions = vec!["proteinuria".into()];
        let moderate = snapshot(150.0, 95.0, 92.0, 18.0, 36.8, 97.0);
        let findings = detect_emergency_conditions(&moderate, &pregnant, &reference);
        assert!(findings.iter().any(|f| f.condition == "preeclampsia"));

        // The same pressures outside pregnancy raise no obstetric finding.
        let findings = detect_emergency_conditions(&mild, &adult(), &reference);
        assert!(findings.is_empty());
    }

    /// T-03: the pediatric septic-shock combination reads its thresholds
    /// from the age band, so the same vitals are unremarkable in an adult.
    #[test]
    fn pediatric_septic_shock_uses_age_band() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(85.0, 60.0, 150.0, 28.0, 39.0, 95.0);

        let child = PatientDemographics::adult(8, Sex::Female);
        let findings = detect_emergency_conditions(&vitals, &child, &reference);
        let shock = find(&findings, "pediatric_septic_shock");
        assert_eq!(shock.severity, ConditionSeverity::LifeThreatening);
        assert!(shock.interventions.contains(&"picu_admission".to_string()));
        assert!(shock.trigger.contains("school_age"));

        let findings = detect_emergency_conditions(&vitals, &adult(), &reference);
        assert!(!findings
            .iter()
            .any(|f| f.condition == "pediatric_septic_shock"));
    }

    #[test]
    fn findings_sorted_most_severe_first() {
        let reference = ReferenceData::load_test();
        // Crisis (life_threatening) + hypoxemia (critical) + tachycardia (high).
        let vitals = snapshot(195.0, 125.0, 155.0, 22.0, 36.8, 89.0);

        let findings = detect_emergency_conditions(&vitals, &adult(), &reference);
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].condition, "hypertensive_crisis");
        assert_eq!(findings[1].condition, "severe_hypoxemia");
        assert_eq!(findings[2].condition, "severe_tachycardia");
    }

    #[test]
    fn unremarkable_snapshot_produces_no_findings() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(118.0, 76.0, 72.0, 14.0, 36.8, 98.0);
        assert!(detect_emergency_conditions(&vitals, &adult(), &reference).is_empty());
    }
}
