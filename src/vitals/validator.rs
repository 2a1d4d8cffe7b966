use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{PatientDemographics, VitalSigns};
use crate::reference::vitals::{VitalBand, VitalBandSet};
use crate::reference::ReferenceData;

use super::emergency::detect_emergency_conditions;
use super::types::{
    AdvisoryFinding, OverallStatus, SignAssessment, VitalCategory, VitalSignsValidation,
    VitalsError,
};

// Physiologically possible ranges. Values outside these are recording or
// transmission errors, not clinical findings.
const SYSTOLIC_RANGE: (f64, f64) = (20.0, 300.0);
const DIASTOLIC_RANGE: (f64, f64) = (10.0, 200.0);
const HEART_RATE_RANGE: (f64, f64) = (0.0, 250.0);
const RESPIRATORY_RATE_RANGE: (f64, f64) = (0.0, 120.0);
const TEMPERATURE_RANGE: (f64, f64) = (25.0, 46.0);
const OXYGEN_SATURATION_RANGE: (f64, f64) = (0.0, 100.0);
const PAIN_SCORE_MAX: u8 = 10;
const AGE_YEARS_MAX: u32 = 130;

/// Organ perfusion threshold; a MAP below it is a hypoperfusion risk.
const MAP_PERFUSION_THRESHOLD: f64 = 65.0;
/// Upper edge of the "approaching the perfusion threshold" advisory band.
const MAP_ADVISORY_CEILING: f64 = 70.0;

/// Mean arterial pressure: `(2 x diastolic + systolic) / 3`.
pub fn mean_arterial_pressure(systolic: f64, diastolic: f64) -> f64 {
    (2.0 * diastolic + systolic) / 3.0
}

/// Validate one vital-signs snapshot for a patient: plausibility bounds,
/// per-sign classification against the selected reference band, emergency
/// detection, coherence advisories, and completeness accounting.
///
/// Partial snapshots are scored, never rejected; only physiologically
/// impossible values produce an error.
pub fn validate_vital_signs(
    vitals: &VitalSigns,
    demographics: &PatientDemographics,
    reference: &ReferenceData,
) -> Result<VitalSignsValidation, VitalsError> {
    // -----------------------------------------------------------------------
    // [1] Recording plausibility
    // -----------------------------------------------------------------------
    if demographics.age_years > AGE_YEARS_MAX {
        return Err(VitalsError::ImpossibleValue {
            field: "age_years",
            value: demographics.age_years as f64,
            min: 0.0,
            max: AGE_YEARS_MAX as f64,
        });
    }
    ensure_plausible("systolic_bp", vitals.systolic_bp, SYSTOLIC_RANGE)?;
    ensure_plausible("diastolic_bp", vitals.diastolic_bp, DIASTOLIC_RANGE)?;
    if let (Some(systolic), Some(diastolic)) = (vitals.systolic_bp, vitals.diastolic_bp) {
        if diastolic >= systolic {
            return Err(VitalsError::ImpossibleValue {
                field: "diastolic_bp",
                value: diastolic,
                min: DIASTOLIC_RANGE.0,
                max: systolic,
            });
        }
    }
    ensure_plausible("heart_rate", vitals.heart_rate, HEART_RATE_RANGE)?;
    ensure_plausible("respiratory_rate", vitals.respiratory_rate, RESPIRATORY_RATE_RANGE)?;
    ensure_plausible("temperature_c", vitals.temperature_c, TEMPERATURE_RANGE)?;
    ensure_plausible("oxygen_saturation", vitals.oxygen_saturation, OXYGEN_SATURATION_RANGE)?;
    if let Some(pain) = vitals.pain_score {
        if pain > PAIN_SCORE_MAX {
            return Err(VitalsError::ImpossibleValue {
                field: "pain_score",
                value: pain as f64,
                min: 0.0,
                max: PAIN_SCORE_MAX as f64,
            });
        }
    }

    // -----------------------------------------------------------------------
    // [2] Band selection
    // -----------------------------------------------------------------------
    let Some(band) = reference.vitals.select_band(demographics) else {
        // The band table is contiguous over 0-130 years, so with the age
        // bound already enforced this only fires on a malformed snapshot.
        return Err(VitalsError::ImpossibleValue {
            field: "age_years",
            value: demographics.age_years as f64,
            min: 0.0,
            max: AGE_YEARS_MAX as f64,
        });
    };

    // -----------------------------------------------------------------------
    // [3] Per-sign classification
    // -----------------------------------------------------------------------
    let assessments = categorize_vital_signs(vitals, band);

    // -----------------------------------------------------------------------
    // [4] Derived pressure and coherence advisories
    // -----------------------------------------------------------------------
    let map = match (vitals.systolic_bp, vitals.diastolic_bp) {
        (Some(systolic), Some(diastolic)) => Some(mean_arterial_pressure(systolic, diastolic)),
        _ => None,
    };

    let mut advisories = Vec::new();
    if let Some(map) = map {
        if map < MAP_PERFUSION_THRESHOLD {
            advisories.push(AdvisoryFinding {
                code: "hypoperfusion_risk".into(),
                detail: format!(
                    "Mean arterial pressure {map:.0} mmHg is below the organ perfusion threshold"
                ),
            });
        } else if map <= MAP_ADVISORY_CEILING {
            advisories.push(AdvisoryFinding {
                code: "map_approaching_threshold".into(),
                detail: format!(
                    "Mean arterial pressure {map:.0} mmHg is approaching the perfusion threshold"
                ),
            });
        }
    }
    if let (Some(systolic), Some(heart_rate)) = (vitals.systolic_bp, vitals.heart_rate) {
        // Hypotension normally provokes compensatory tachycardia. Low
        // pressure with a quiet heart rate points at medication effect,
        // conduction disease, or pump failure.
        if systolic < band.systolic.low && heart_rate <= band.heart_rate.high {
            advisories.push(AdvisoryFinding {
                code: "compensatory_response_missing".into(),
                detail: format!(
                    "Systolic {systolic:.0} mmHg without compensatory tachycardia \
                     (heart rate {heart_rate:.0} bpm)"
                ),
            });
        }
    }

    // -----------------------------------------------------------------------
    // [5] Emergency detection
    // -----------------------------------------------------------------------
    let emergencies = detect_emergency_conditions(vitals, demographics, reference);

    // -----------------------------------------------------------------------
    // [6] Verdict
    // -----------------------------------------------------------------------
    let overall_status = overall_status(&assessments, !emergencies.is_empty());
    if emergencies.is_empty() {
        debug!(
            band = %band.label,
            status = overall_status.as_str(),
            signs = assessments.len(),
            "vital signs classified"
        );
    } else {
        warn!(
            band = %band.label,
            emergencies = emergencies.len(),
            condition = %emergencies[0].condition,
            "emergency vital signs detected"
        );
    }

    Ok(VitalSignsValidation {
        id: Uuid::new_v4(),
        band_label: band.label.clone(),
        overall_status,
        assessments,
        emergencies,
        advisories,
        mean_arterial_pressure: map,
        missing_values: vitals.missing_fields(),
        completeness_score: vitals.completeness_score(),
        requires_intervention: overall_status == OverallStatus::Critical,
    })
}

/// Classify each present vital sign against the band set. Absent signs are
/// skipped; completeness is reported separately.
pub fn categorize_vital_signs(vitals: &VitalSigns, band: &VitalBandSet) -> Vec<SignAssessment> {
    let mut assessments = Vec::new();
    if let Some(value) = vitals.systolic_bp {
        assessments.push(assess("systolic_bp", value, &band.systolic, blood_pressure_label));
    }
    if let Some(value) = vitals.diastolic_bp {
        assessments.push(assess("diastolic_bp", value, &band.diastolic, blood_pressure_label));
    }
    if let Some(value) = vitals.heart_rate {
        assessments.push(assess("heart_rate", value, &band.heart_rate, heart_rate_label));
    }
    if let Some(value) = vitals.respiratory_rate {
        assessments.push(assess(
            "respiratory_rate",
            value,
            &band.respiratory_rate,
            respiratory_rate_label,
        ));
    }
    if let Some(value) = vitals.temperature_c {
        assessments.push(assess("temperature_c", value, &band.temperature, temperature_label));
    }
    if let Some(value) = vitals.oxygen_saturation {
        assessments.push(assess(
            "oxygen_saturation",
            value,
            &band.oxygen_saturation,
            oxygen_saturation_label,
        ));
    }
    assessments
}

// ---------------------------------------------------------------------------
// [7] Internals
// ---------------------------------------------------------------------------

fn ensure_plausible(
    field: &'static str,
    value: Option<f64>,
    range: (f64, f64),
) -> Result<(), VitalsError> {
    let Some(value) = value else { return Ok(()) };
    if !value.is_finite() || value < range.0 || value > range.1 {
        return Err(VitalsError::ImpossibleValue {
            field,
            value,
            min: range.0,
            max: range.1,
        });
    }
    Ok(())
}

fn classify(value: f64, band: &VitalBand) -> VitalCategory {
    if value < band.critical_low || value >= band.critical_high {
        VitalCategory::Critical
    } else if value < band.low {
        VitalCategory::Low
    } else if value <= band.high {
        VitalCategory::Normal
    } else if value <= band.elevated_high {
        VitalCategory::Elevated
    } else {
        VitalCategory::High
    }
}

fn assess(
    field: &'static str,
    value: f64,
    band: &VitalBand,
    label_of: fn(f64, &VitalBand, VitalCategory) -> &'static str,
) -> SignAssessment {
    let category = classify(value, band);
    SignAssessment {
        field,
        value,
        category,
        label: label_of(value, band, category),
    }
}

fn blood_pressure_label(value: f64, band: &VitalBand, category: VitalCategory) -> &'static str {
    match category {
        VitalCategory::Critical if value < band.low => "critical_hypotension",
        VitalCategory::Critical => "critical_hypertension",
        VitalCategory::Low => "hypotension",
        VitalCategory::Normal => "normal",
        VitalCategory::Elevated => "elevated",
        VitalCategory::High => "hypertension",
    }
}

fn heart_rate_label(value: f64, band: &VitalBand, category: VitalCategory) -> &'static str {
    match category {
        VitalCategory::Critical if value < band.low => "severe_bradycardia",
        VitalCategory::Critical => "severe_tachycardia",
        VitalCategory::Low => "bradycardia",
        VitalCategory::Normal => "normal",
        VitalCategory::Elevated => "mild_tachycardia",
        VitalCategory::High => "tachycardia",
    }
}

fn respiratory_rate_label(value: f64, band: &VitalBand, category: VitalCategory) -> &'static str {
    match category {
        VitalCategory::Critical if value < band.low => "severe_bradypnea",
        VitalCategory::Critical => "severe_tachypnea",
        VitalCategory::Low => "bradypnea",
        VitalCategory::Normal => "normal",
        VitalCategory::Elevated => "mild_tachypnea",
        VitalCategory::High => "tachypnea",
    }
}

fn temperature_label(value: f64, band: &VitalBand, category: VitalCategory) -> &'static str {
    match category {
        VitalCategory::Critical if value < band.low => "severe_hypothermia",
        VitalCategory::Critical => "hyperthermia",
        VitalCategory::Low => "hypothermia",
        VitalCategory::Normal => "normal",
        VitalCategory::Elevated => "low_grade_fever",
        VitalCategory::High => "fever",
    }
}

fn oxygen_saturation_label(_value: f64, _band: &VitalBand, category: VitalCategory) -> &'static str {
    // Saturation has no meaningful upper pathology; the band's upper
    // thresholds sit above 100% and are unreachable after bounds checks.
    match category {
        VitalCategory::Critical => "critical_hypoxemia",
        VitalCategory::Low => "hypoxemia",
        _ => "normal",
    }
}

fn overall_status(assessments: &[SignAssessment], has_emergency: bool) -> OverallStatus {
    if has_emergency
        || assessments
            .iter()
            .any(|a| a.category == VitalCategory::Critical)
    {
        OverallStatus::Critical
    } else if assessments
        .iter()
        .any(|a| a.category != VitalCategory::Normal)
    {
        OverallStatus::Abnormal
    } else {
        OverallStatus::Normal
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::models::{ConsciousnessLevel, Sex};

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

    /// T-01: a textbook adult snapshot is normal across the board.
    #[test]
    fn normal_adult_snapshot() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(118.0, 76.0, 72.0, 14.0, 36.8, 98.0);

        let result = validate_vital_signs(&vitals, &adult(), &reference).unwrap();
        assert_eq!(result.band_label, "adult");
        assert_eq!(result.overall_status, OverallStatus::Normal);
        assert!(result.assessments.iter().all(|a| a.label == "normal"));
        assert!(result.emergencies.is_empty());
        assert!(result.advisories.is_empty());
        assert_eq!(result.completeness_score, 1.0);
        assert!(!result.requires_intervention);
    }

    /// T-02: MAP of 95/65 is exactly 75 mmHg.
    #[test]
    fn mean_arterial_pressure_formula() {
        assert_eq!(mean_arterial_pressure(95.0, 65.0), 75.0);

        let reference = ReferenceData::load_test();
        let vitals = snapshot(95.0, 65.0, 72.0, 14.0, 36.8, 98.0);
        let result = validate_vital_signs(&vitals, &adult(), &reference).unwrap();
        assert_eq!(result.mean_arterial_pressure, Some(75.0));
    }

    /// T-03: SpO2 of 120% is a recording error, not a clinical finding.
    #[test]
    fn impossible_oxygen_saturation_rejected() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(118.0, 76.0, 72.0, 14.0, 36.8, 120.0);

        let err = validate_vital_signs(&vitals, &adult(), &reference).unwrap_err();
        assert!(matches!(
            err,
            VitalsError::ImpossibleValue {
                field: "oxygen_saturation",
                ..
            }
        ));
    }

    /// T-04: heart rate 300 bpm is rejected as impossible.
    #[test]
    fn impossible_heart_rate_rejected() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(118.0, 76.0, 300.0, 14.0, 36.8, 98.0);

        let err = validate_vital_signs(&vitals, &adult(), &reference).unwrap_err();
        assert!(matches!(
            err,
            VitalsError::ImpossibleValue {
                field: "heart_rate",
                value,
                ..
            } if value == 300.0
        ));
    }

    #[test]
    fn inverted_blood_pressure_rejected() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(80.0, 95.0, 72.0, 14.0, 36.8, 98.0);

        let err = validate_vital_signs(&vitals, &adult(), &reference).unwrap_err();
        assert!(matches!(
            err,
            VitalsError::ImpossibleValue {
                field: "diastolic_bp",
                max,
                ..
            } if max == 80.0
        ));
    }

    #[test]
    fn implausible_age_rejected() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(118.0, 76.0, 72.0, 14.0, 36.8, 98.0);
        let demo = PatientDemographics::adult(200, Sex::Female);

        let err = validate_vital_signs(&vitals, &demo, &reference).unwrap_err();
        assert!(matches!(
            err,
            VitalsError::ImpossibleValue {
                field: "age_years",
                ..
            }
        ));
    }

    /// T-05: 128/82 in an adult is elevated on both sides, abnormal overall.
    #[test]
    fn elevated_blood_pressure_labeled() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(128.0, 82.0, 72.0, 14.0, 36.8, 98.0);

        let result = validate_vital_signs(&vitals, &adult(), &reference).unwrap();
        let systolic = result.assessment("systolic_bp").unwrap();
        assert_eq!(systolic.category, VitalCategory::Elevated);
        assert_eq!(systolic.label, "elevated");
        assert_eq!(result.assessment("diastolic_bp").unwrap().label, "elevated");
        assert_eq!(result.overall_status, OverallStatus::Abnormal);
        assert!(!result.requires_intervention);
    }

    #[test]
    fn fever_labels_by_band() {
        let reference = ReferenceData::load_test();

        let low_grade = snapshot(118.0, 76.0, 72.0, 14.0, 37.1, 98.0);
        let result = validate_vital_signs(&low_grade, &adult(), &reference).unwrap();
        assert_eq!(
            result.assessment("temperature_c").unwrap().label,
            "low_grade_fever"
        );

        let febrile = snapshot(118.0, 76.0, 72.0, 14.0, 38.5, 98.0);
        let result = validate_vital_signs(&febrile, &adult(), &reference).unwrap();
        assert_eq!(result.assessment("temperature_c").unwrap().label, "fever");
    }

    /// T-06: crisis needs BOTH systolic >=180 and diastolic >=120; the
    /// boundary pair 195/125 detects, 185/100 does not.
    #[test]
    fn hypertensive_crisis_requires_both_pressures() {
        let reference = ReferenceData::load_test();

        let crisis = snapshot(195.0, 125.0, 96.0, 18.0, 36.8, 97.0);
        let result = validate_vital_signs(&crisis, &adult(), &reference).unwrap();
        assert!(result.has_emergency("hypertensive_crisis"));
        assert_eq!(result.overall_status, OverallStatus::Critical);
        assert!(result.requires_intervention);

        let boundary = snapshot(180.0, 120.0, 96.0, 18.0, 36.8, 97.0);
        let result = validate_vital_signs(&boundary, &adult(), &reference).unwrap();
        assert!(result.has_emergency("hypertensive_crisis"));

        let systolic_only = snapshot(185.0, 100.0, 96.0, 18.0, 36.8, 97.0);
        let result = validate_vital_signs(&systolic_only, &adult(), &reference).unwrap();
        assert!(!result.has_emergency("hypertensive_crisis"));
        // The isolated systolic reading still classifies as critical.
        assert_eq!(
            result.assessment("systolic_bp").unwrap().label,
            "critical_hypertension"
        );
        assert_eq!(result.overall_status, OverallStatus::Critical);
    }

    #[test]
    fn hypotensive_shock_below_perfusion_threshold() {
        let reference = ReferenceData::load_test();
        // MAP = (2*50 + 85)/3 = 61.7 mmHg.
        let vitals = snapshot(85.0, 50.0, 120.0, 22.0, 36.8, 96.0);

        let result = validate_vital_signs(&vitals, &adult(), &reference).unwrap();
        assert!(result.has_emergency("hypotensive_shock"));
        assert!(result.has_advisory("hypoperfusion_risk"));
        assert!(result.requires_intervention);
        let shock = &result.emergencies[0];
        assert!(shock.interventions.contains(&"iv_fluids".to_string()));
    }

    #[test]
    fn map_exactly_at_threshold_is_advisory_only() {
        let reference = ReferenceData::load_test();
        // MAP = (2*55 + 85)/3 = exactly 65 mmHg: at the threshold, not below.
        let vitals = snapshot(85.0, 55.0, 110.0, 18.0, 36.8, 97.0);

        let result = validate_vital_signs(&vitals, &adult(), &reference).unwrap();
        assert_eq!(result.mean_arterial_pressure, Some(65.0));
        assert!(!result.has_emergency("hypotensive_shock"));
        assert!(result.has_advisory("map_approaching_threshold"));
        assert_eq!(result.overall_status, OverallStatus::Abnormal);
    }

    /// T-07: hypotension without compensatory tachycardia is an advisory,
    /// separate from any threshold finding.
    #[test]
    fn missing_compensatory_response_flagged() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(85.0, 60.0, 70.0, 16.0, 36.8, 97.0);

        let result = validate_vital_signs(&vitals, &adult(), &reference).unwrap();
        assert!(result.has_advisory("compensatory_response_missing"));
        assert_eq!(result.overall_status, OverallStatus::Abnormal);
    }

    #[test]
    fn partial_snapshot_scores_without_error() {
        let reference = ReferenceData::load_test();
        let vitals = VitalSigns {
            recorded_at: at_noon(),
            systolic_bp: None,
            diastolic_bp: None,
            heart_rate: Some(72.0),
            respiratory_rate: None,
            temperature_c: None,
            oxygen_saturation: None,
            pain_score: None,
            consciousness: None,
        };

        let result = validate_vital_signs(&vitals, &adult(), &reference).unwrap();
        assert_eq!(result.missing_values.len(), 5);
        assert!(result.completeness_score < 0.2);
        assert_eq!(result.overall_status, OverallStatus::Normal);
        assert!(result.mean_arterial_pressure.is_none());
    }

    #[test]
    fn geriatric_band_relaxes_systolic_range() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(138.0, 82.0, 70.0, 16.0, 36.8, 95.0);
        let demo = PatientDemographics::adult(70, Sex::Female);

        let result = validate_vital_signs(&vitals, &demo, &reference).unwrap();
        assert_eq!(result.band_label, "geriatric");
        assert_eq!(result.assessment("systolic_bp").unwrap().label, "normal");
    }

    #[test]
    fn validation_is_idempotent() {
        let reference = ReferenceData::load_test();
        let vitals = snapshot(195.0, 125.0, 96.0, 18.0, 36.8, 97.0);

        let first = validate_vital_signs(&vitals, &adult(), &reference).unwrap();
        let second = validate_vital_signs(&vitals, &adult(), &reference).unwrap();
        assert_eq!(first.assessments, second.assessments);
        assert_eq!(first.emergencies, second.emergencies);
        assert_eq!(first.overall_status, second.overall_status);
        assert_ne!(first.id, second.id);
    }
}
