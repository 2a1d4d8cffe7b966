//! Dosage calculation pipeline.
//!
//! Every calculation runs the same canonical check order: patient
//! plausibility, rule resolution, indication, allergy, base dose, pediatric
//! and geriatric constraints, renal and hepatic adjustment, interaction
//! screen, range validation, controlled-substance check. Hard stops are
//! errors; everything survivable is returned as warnings and adjustments on
//! the result, ordered by descending severity.

use tracing::{info, warn};
use uuid::Uuid;

use crate::interactions::{check_drug_interactions, InteractionFinding};
use crate::models::{
    AgeClass, FindingSeverity, MedicationProfile, PatientProfile, RiskLevel, Urgency,
};
use crate::reference::dosing::{DoseBasis, DosingRule};
use crate::reference::ReferenceData;

use super::adjustments::{
    adjust_dosage_for_hepatic_function, adjust_dosage_for_renal_function,
    adjust_dosage_for_weight, body_surface_area, estimate_creatinine_clearance,
};
use super::types::{
    AppliedAdjustment, AuditRecord, CalculationMethod, DosageError, DosageRequest, DosageResult,
    DosageWarning,
};
use super::units::{doses_per_day, medication_name_of};

const DEFAULT_GLUCOSE_TARGET_MG_DL: f64 = 120.0;
const DEFAULT_INSULIN_SENSITIVITY: f64 = 50.0;

/// Calculate a dose for one medication order.
pub fn calculate_dosage(
    request: &DosageRequest,
    reference: &ReferenceData,
) -> Result<DosageResult, DosageError> {
    // -----------------------------------------------------------------------
    // [1] Patient plausibility — reject impossible profiles before any
    //     clinical logic runs.
    // -----------------------------------------------------------------------
    if let Some(reason) = request.patient.plausibility_issue() {
        warn!(%reason, "dosage request rejected on patient bounds");
        return Err(DosageError::InvalidPatient { reason });
    }

    // -----------------------------------------------------------------------
    // [2] Rule resolution (brand names normalize to generic) and indication.
    // -----------------------------------------------------------------------
    let generic = reference.dosing.resolve_generic(&request.medication);
    let rule = reference
        .dosing
        .rule(&generic)
        .ok_or_else(|| DosageError::UnknownMedication {
            name: request.medication.clone(),
        })?;

    if !rule.has_indication(&request.indication) {
        return Err(DosageError::InvalidIndication {
            medication: generic,
            indication: request.indication.clone(),
        });
    }

    // -----------------------------------------------------------------------
    // [3] Allergy check — unconditional, before any dosing math, and never
    //     bypassed by urgency.
    // -----------------------------------------------------------------------
    ensure_no_allergy(&generic, &request.patient, reference)?;

    match rule.basis {
        DoseBasis::Protocol => {
            return calculate_emergency_dosage(
                &request.medication,
                &request.indication,
                &request.patient,
                reference,
            );
        }
        DoseBasis::SlidingScale => return sliding_scale_dosage(request, rule, generic, reference),
        _ => {}
    }

    let mut warnings: Vec<DosageWarning> = Vec::new();
    let mut adjustments: Vec<AppliedAdjustment> = Vec::new();
    let mut monitoring: Vec<String> = rule.monitoring.clone();
    let mut frequency = rule.frequency.clone();

    // -----------------------------------------------------------------------
    // [4] Base dose: fixed, weight-based (unit/kg) or BSA-based (unit/m²).
    //     A clinician-entered dose overrides the table but skips no check.
    // -----------------------------------------------------------------------
    let (mut dose, mut method) = match rule.basis {
        DoseBasis::PerKg { .. } => (
            adjust_dosage_for_weight(rule, request.patient.weight_kg)
                .map(|w| w.per_dose)
                .unwrap_or(rule.min_single_dose),
            CalculationMethod::WeightBased,
        ),
        DoseBasis::PerM2 { low, high } => {
            let bsa = body_surface_area(request.patient.weight_kg, request.patient.height_cm);
            adjustments.push(AppliedAdjustment {
                adjustment_type: "bsa_based".into(),
                factor: bsa,
                reason: format!("body surface area {bsa:.2} m²"),
            });
            (((low + high) / 2.0) * bsa, CalculationMethod::BsaBased)
        }
        _ => (
            rule.standard_dose.unwrap_or(rule.min_single_dose),
            CalculationMethod::Fixed,
        ),
    };
    if let Some(requested) = request.requested_dose {
        dose = requested;
    }

    // -----------------------------------------------------------------------
    // [5] Pediatric constraints: class prohibitions are hard stops,
    //     weight-based caps are warnings.
    // -----------------------------------------------------------------------
    let mut pediatric_daily_limit: Option<f64> = None;
    if request.patient.age_class() == AgeClass::Pediatric {
        match &rule.pediatric {
            Some(pediatric) => {
                if let Some(min_age) = pediatric.min_age_years {
                    if request.patient.age_years < min_age {
                        let reason = pediatric
                            .contraindication_reason
                            .clone()
                            .unwrap_or_else(|| "pediatric safety".to_string());
                        warn!(
                            medication = %generic,
                            age = request.patient.age_years,
                            "pediatric contraindication",
                        );
                        return Err(DosageError::AbsoluteContraindication {
                            medication: generic,
                            reason: format!("Contraindicated under {min_age} years: {reason}"),
                        });
                    }
                }
                if let (Some(low), Some(high)) =
                    (pediatric.dose_per_kg_low, pediatric.dose_per_kg_high)
                {
                    let weight = request.patient.weight_kg;
                    let weight_cap = high * weight;
                    match request.requested_dose {
                        Some(requested) if requested > weight_cap => {
                            dose = weight_cap;
                            warnings.push(DosageWarning::new(
                                "pediatric_safety",
                                FindingSeverity::High,
                                vec![generic.clone()],
                                format!(
                                    "Requested dose capped at {high} {}/kg for weight {weight} kg",
                                    rule.unit
                                ),
                            ));
                        }
                        Some(_) => {}
                        None => {
                            let mid = (low + high) / 2.0;
                            dose = mid * weight;
                            method = CalculationMethod::WeightBased;
                            warnings.push(DosageWarning::new(
                                "pediatric_safety",
                                FindingSeverity::Moderate,
                                vec![generic.clone()],
                                format!("Pediatric weight-based dosing: {mid} {}/kg", rule.unit),
                            ));
                        }
                    }
                    if let Some(cap) = pediatric.max_single_dose {
                        if dose > cap {
                            dose = cap;
                        }
                    }
                    if let Some(per_day) = pediatric.max_doses_per_day {
                        pediatric_daily_limit = Some(weight_cap * f64::from(per_day));
                    }
                }
                if let Some(note) = &pediatric.safety_note {
                    warnings.push(DosageWarning::new(
                        "pediatric_safety",
                        FindingSeverity::High,
                        vec![generic.clone()],
                        note.clone(),
                    ));
                }
            }
            None => {
                warnings.push(DosageWarning::new(
                    "pediatric_safety",
                    FindingSeverity::High,
                    vec![generic.clone()],
                    "No established pediatric dosing; specialist consultation required",
                ));
            }
        }
    }

    // -----------------------------------------------------------------------
    // [6] Geriatric reduction and Beers-criteria review.
    // -----------------------------------------------------------------------
    if request.patient.age_class() == AgeClass::Geriatric {
        let factor = if rule.narrow_therapeutic_index { 0.5 } else { 0.75 };
        dose *= factor;
        adjustments.push(AppliedAdjustment {
            adjustment_type: "geriatric_reduction".into(),
            factor,
            reason: if rule.narrow_therapeutic_index {
                "narrow_therapeutic_index".into()
            } else {
                "age_related_clearance_decline".into()
            },
        });
        if let Some(concern) = reference.dosing.beers_concern(&generic) {
            warnings.push(DosageWarning::new(
                "beers_criteria",
                FindingSeverity::High,
                vec![generic.clone()],
                concern.to_string(),
            ));
        }
    }

    // -----------------------------------------------------------------------
    // [7] Renal then hepatic adjustment. Emergency urgency bypasses both —
    //     but never the allergy check above.
    // -----------------------------------------------------------------------
    if request.urgency != Urgency::Emergency {
        if let Some(clearance) = estimate_creatinine_clearance(&request.patient) {
            let renal = adjust_dosage_for_renal_function(rule, dose, clearance)?;
            dose = renal.dose;
            if let Some(interval) = renal.frequency_override {
                frequency = interval;
            }
            if let Some(adjustment) = renal.adjustment {
                adjustments.push(adjustment);
            }
            if let Some(warning) = renal.warning {
                warnings.push(warning);
            }
        }

        let requested_daily = dose * doses_per_day(&frequency);
        let hepatic = adjust_dosage_for_hepatic_function(
            rule,
            dose,
            requested_daily,
            request.patient.hepatic_function,
        )?;
        dose = hepatic.dose;
        if let Some(adjustment) = hepatic.adjustment {
            adjustments.push(adjustment);
        }
        if let Some(warning) = hepatic.warning {
            warnings.push(warning);
        }
    }

    // -----------------------------------------------------------------------
    // [8] Interaction screen of current medications. Fatal findings block;
    //     everything else becomes warnings.
    // -----------------------------------------------------------------------
    for finding in screen_interactions(&generic, rule, &request.patient, reference) {
        if finding.severity == FindingSeverity::Fatal {
            let existing = finding
                .drugs
                .iter()
                .find(|d| **d != generic)
                .cloned()
                .unwrap_or_else(|| "current medication".to_string());
            warn!(
                medication = %generic,
                %existing,
                interaction = %finding.label,
                "fatal interaction blocks dosing",
            );
            return Err(DosageError::FatalInteraction {
                medication: generic,
                existing,
                interaction: finding.label,
            });
        }
        for item in &finding.monitoring {
            push_unique(&mut monitoring, item);
        }
        let description = match &finding.management {
            Some(plan) => format!("{}: {}", finding.label, plan),
            None => finding.label.clone(),
        };
        warnings.push(DosageWarning::new(
            "drug_interaction",
            finding.severity,
            finding.drugs,
            description,
        ));
    }

    if request.prior_overdose {
        warnings.push(DosageWarning::new(
            "overdose_history",
            FindingSeverity::High,
            vec![generic.clone()],
            "Prior overdose on record; verify dosing and monitor closely",
        ));
    }

    // -----------------------------------------------------------------------
    // [9] Range validation: toxic threshold is a hard stop, table maxima cap.
    // -----------------------------------------------------------------------
    if let Some(toxic) = rule.toxic_dose {
        if dose > toxic {
            warn!(medication = %generic, dose, toxic, "dose exceeds toxic level");
            return Err(DosageError::ToxicDose {
                dose,
                toxic_threshold: toxic,
                unit: rule.unit.clone(),
            });
        }
    }
    if dose > rule.max_single_dose {
        warnings.push(DosageWarning::new(
            "dose_capped",
            FindingSeverity::Moderate,
            vec![generic.clone()],
            format!(
                "Requested dose capped at maximum single dose {} {}",
                rule.max_single_dose, rule.unit
            ),
        ));
        dose = rule.max_single_dose;
    }
    let mut total_daily = dose * doses_per_day(&frequency);
    if let Some(limit) = pediatric_daily_limit {
        total_daily = total_daily.min(limit);
    }
    if total_daily > rule.max_daily_dose {
        warnings.push(DosageWarning::new(
            "daily_maximum",
            FindingSeverity::Moderate,
            vec![generic.clone()],
            format!(
                "Total daily dose capped at {} {}",
                rule.max_daily_dose, rule.unit
            ),
        ));
        total_daily = rule.max_daily_dose;
    }

    // -----------------------------------------------------------------------
    // [10] Controlled-substance schedule.
    // -----------------------------------------------------------------------
    if let Some(schedule) = reference.dosing.schedule(&generic) {
        let severity = if schedule == "II" {
            FindingSeverity::High
        } else {
            FindingSeverity::Moderate
        };
        warnings.push(DosageWarning::new(
            "controlled_substance",
            severity,
            vec![generic.clone()],
            format!("Schedule {schedule} controlled substance; special authorization required"),
        ));
    }

    // -----------------------------------------------------------------------
    // [11] Assemble the audited result, warnings ordered by severity.
    // -----------------------------------------------------------------------
    warnings.sort_by(|a, b| b.severity.cmp(&a.severity));
    let risk_level = overall_risk(&warnings, &adjustments);
    info!(
        medication = %generic,
        dose,
        warning_count = warnings.len(),
        risk = risk_level.as_str(),
        "dosage calculated",
    );

    Ok(DosageResult {
        id: Uuid::new_v4(),
        medication: generic,
        dose_amount: dose,
        dose_unit: rule.unit.clone(),
        frequency,
        route: rule.route.clone(),
        duration: rule.duration.clone(),
        total_daily_dose: Some(total_daily),
        max_single_dose: rule.max_single_dose,
        instructions: None,
        warnings,
        monitoring,
        adjustments,
        audit: AuditRecord::new(method, risk_level),
    })
}

/// Pediatric entry point; rejects non-pediatric profiles, then runs the
/// shared pipeline (which applies the pediatric constraints).
pub fn calculate_pediatric_dosage(
    request: &DosageRequest,
    reference: &ReferenceData,
) -> Result<DosageResult, DosageError> {
    if request.patient.age_class() != AgeClass::Pediatric {
        return Err(DosageError::InvalidPatient {
            reason: format!(
                "Not a pediatric patient: {} years",
                request.patient.age_years
            ),
        });
    }
    calculate_dosage(request, reference)
}

/// Geriatric entry point; rejects non-geriatric profiles.
pub fn calculate_geriatric_dosage(
    request: &DosageRequest,
    reference: &ReferenceData,
) -> Result<DosageResult, DosageError> {
    if request.patient.age_class() != AgeClass::Geriatric {
        return Err(DosageError::InvalidPatient {
            reason: format!(
                "Not a geriatric patient: {} years",
                request.patient.age_years
            ),
        });
    }
    calculate_dosage(request, reference)
}

/// Chemotherapy entry point; the medication must be dosed by body surface
/// area.
pub fn calculate_chemotherapy_dosage(
    request: &DosageRequest,
    reference: &ReferenceData,
) -> Result<DosageResult, DosageError> {
    let generic = reference.dosing.resolve_generic(&request.medication);
    let rule = reference
        .dosing
        .rule(&generic)
        .ok_or_else(|| DosageError::UnknownMedication {
            name: request.medication.clone(),
        })?;
    if !matches!(rule.basis, DoseBasis::PerM2 { .. }) {
        return Err(DosageError::UnsafeDose {
            reason: format!("{generic} is not dosed by body surface area"),
        });
    }
    calculate_dosage(request, reference)
}

/// Insulin entry point; the medication must be a sliding-scale rule and the
/// request must carry glucose inputs.
pub fn calculate_insulin_dosage(
    request: &DosageRequest,
    reference: &ReferenceData,
) -> Result<DosageResult, DosageError> {
    let generic = reference.dosing.resolve_generic(&request.medication);
    let rule = reference
        .dosing
        .rule(&generic)
        .ok_or_else(|| DosageError::UnknownMedication {
            name: request.medication.clone(),
        })?;
    if rule.basis != DoseBasis::SlidingScale {
        return Err(DosageError::UnsafeDose {
            reason: format!("{generic} is not a sliding-scale medication"),
        });
    }
    calculate_dosage(request, reference)
}

/// Protocol dosing for code situations. Bypasses renal/hepatic reduction by
/// construction, but never the allergy check.
pub fn calculate_emergency_dosage(
    medication: &str,
    indication: &str,
    patient: &PatientProfile,
    reference: &ReferenceData,
) -> Result<DosageResult, DosageError> {
    if let Some(reason) = patient.plausibility_issue() {
        return Err(DosageError::InvalidPatient { reason });
    }
    let generic = reference.dosing.resolve_generic(medication);
    let Some(protocol) = reference.dosing.emergency_protocol(&generic, indication) else {
        return Err(DosageError::InvalidIndication {
            medication: generic,
            indication: indication.to_string(),
        });
    };
    ensure_no_allergy(&generic, patient, reference)?;

    let mut warnings = Vec::new();
    if let Some(max_doses) = protocol.max_doses {
        warnings.push(DosageWarning::new(
            "protocol_limit",
            FindingSeverity::Moderate,
            vec![generic.clone()],
            format!("Protocol maximum {max_doses} doses"),
        ));
    }
    let monitoring = reference
        .dosing
        .rule(&generic)
        .map(|r| r.monitoring.clone())
        .unwrap_or_default();

    info!(
        medication = %generic,
        indication,
        dose = protocol.dose,
        "emergency protocol dose",
    );

    Ok(DosageResult {
        id: Uuid::new_v4(),
        medication: generic,
        dose_amount: protocol.dose,
        dose_unit: protocol.unit.clone(),
        frequency: protocol.frequency.clone(),
        route: protocol.route.clone(),
        duration: None,
        total_daily_dose: None,
        max_single_dose: protocol.dose_max.unwrap_or(protocol.dose),
        instructions: protocol.instructions.clone(),
        warnings,
        monitoring,
        adjustments: Vec::new(),
        audit: AuditRecord::new(CalculationMethod::Protocol, RiskLevel::High),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sliding_scale_dosage(
    request: &DosageRequest,
    rule: &DosingRule,
    generic: String,
    reference: &ReferenceData,
) -> Result<DosageResult, DosageError> {
    let policy = &reference.dosing.insulin;
    let Some(glucose) = request.current_blood_glucose_mg_dl else {
        return Err(DosageError::UnsafeDose {
            reason: "Sliding-scale dosing requires a current blood glucose".into(),
        });
    };
    let target = request
        .target_blood_glucose_mg_dl
        .unwrap_or(DEFAULT_GLUCOSE_TARGET_MG_DL);
    let sensitivity = request
        .insulin_sensitivity_factor
        .unwrap_or(DEFAULT_INSULIN_SENSITIVITY);
    if sensitivity <= 0.0 {
        return Err(DosageError::UnsafeDose {
            reason: "Insulin sensitivity factor must be positive".into(),
        });
    }

    let raw_correction = (glucose - target) / sensitivity;
    if raw_correction > policy.correction_cap_units {
        warn!(
            glucose,
            correction = raw_correction,
            cap = policy.correction_cap_units,
            "insulin correction above safety cap",
        );
        return Err(DosageError::UnsafeDose {
            reason: "Calculated insulin dose exceeds safety limits".into(),
        });
    }
    let correction = raw_correction.max(0.0);

    let mut warnings = Vec::new();
    if raw_correction < 0.0 {
        warnings.push(DosageWarning::new(
            "hypoglycemia_risk",
            FindingSeverity::High,
            vec![generic.clone()],
            "Blood glucose below target; corrective insulin withheld",
        ));
    } else if correction > 0.0 {
        warnings.push(DosageWarning::new(
            "hypoglycemia_risk",
            FindingSeverity::Moderate,
            vec![generic.clone()],
            "Monitor for hypoglycemia after corrective dosing",
        ));
    }

    let basal = policy.basal_units_per_kg_day * request.patient.weight_kg;
    let adjustments = vec![AppliedAdjustment {
        adjustment_type: "basal_insulin".into(),
        factor: policy.basal_units_per_kg_day,
        reason: format!(
            "basal requirement {basal:.1} units/day at {:.0} kg",
            request.patient.weight_kg
        ),
    }];
    let risk_level = overall_risk(&warnings, &adjustments);
    info!(
        medication = %generic,
        glucose,
        correction,
        basal,
        "sliding-scale insulin calculated",
    );

    Ok(DosageResult {
        id: Uuid::new_v4(),
        medication: generic,
        dose_amount: correction,
        dose_unit: rule.unit.clone(),
        frequency: rule.frequency.clone(),
        route: rule.route.clone(),
        duration: None,
        total_daily_dose: Some(basal + correction),
        max_single_dose: rule.max_single_dose,
        instructions: None,
        warnings,
        monitoring: rule.monitoring.clone(),
        adjustments,
        audit: AuditRecord::new(CalculationMethod::SlidingScale, risk_level),
    })
}

fn ensure_no_allergy(
    generic: &str,
    patient: &PatientProfile,
    reference: &ReferenceData,
) -> Result<(), DosageError> {
    for allergen in &patient.allergies {
        let direct = allergen.eq_ignore_ascii_case(generic);
        let family = reference.dosing.shared_family(generic, allergen).is_some();
        if direct || family {
            warn!(medication = %generic, %allergen, "allergy contraindication");
            return Err(DosageError::AllergyContraindication {
                medication: generic.to_string(),
                allergen: allergen.clone(),
            });
        }
    }
    Ok(())
}

fn screen_interactions(
    generic: &str,
    rule: &DosingRule,
    patient: &PatientProfile,
    reference: &ReferenceData,
) -> Vec<InteractionFinding> {
    let proposed = MedicationProfile::minimal(generic, rule.drug_class.clone());
    let current: Vec<MedicationProfile> = patient
        .current_medications
        .iter()
        .filter_map(|entry| medication_name_of(entry))
        .map(|name| reference.dosing.resolve_generic(name))
        .map(|name| {
            let class = reference.dosing.drug_class_of(&name).unwrap_or_default();
            MedicationProfile::minimal(name, class)
        })
        .collect();
    if current.is_empty() {
        return Vec::new();
    }
    // Names are validated non-empty above, so the identifier check cannot
    // fail here.
    check_drug_interactions(&current, &proposed, reference).unwrap_or_default()
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

fn overall_risk(warnings: &[DosageWarning], adjustments: &[AppliedAdjustment]) -> RiskLevel {
    if warnings
        .iter()
        .any(|w| w.severity >= FindingSeverity::High)
    {
        RiskLevel::High
    } else if !warnings.is_empty() || !adjustments.is_empty() {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dosage::types::CHECKS_PERFORMED;
    use crate::models::{HepaticFunction, Sex};

    fn adult() -> PatientProfile {
        PatientProfile {
            age_years: 40,
            weight_kg: 70.0,
            height_cm: 175.0,
            sex: Sex::Male,
            serum_creatinine_mg_dl: None,
            creatinine_clearance_ml_min: None,
            hepatic_function: HepaticFunction::Normal,
            allergies: Vec::new(),
            current_medications: Vec::new(),
            conditions: Vec::new(),
            pregnant: false,
        }
    }

    fn child(age_years: u32, weight_kg: f64) -> PatientProfile {
        PatientProfile {
            age_years,
            weight_kg,
            height_cm: 125.0,
            ..adult()
        }
    }

    fn geriatric() -> PatientProfile {
        PatientProfile {
            age_years: 78,
            ..adult()
        }
    }

    fn request(medication: &str, patient: PatientProfile, indication: &str) -> DosageRequest {
        DosageRequest::routine(medication, patient, indication)
    }

    /// T-01: fixed-rule adult dosing returns the table's standard dose and a
    /// full audit record.
    #[test]
    fn standard_adult_dose() {
        let reference = ReferenceData::load_test();
        let result = calculate_dosage(
            &request("amoxicillin", adult(), "bacterial_infection"),
            &reference,
        )
        .unwrap();

        assert_eq!(result.medication, "amoxicillin");
        assert_eq!(result.dose_amount, 500.0);
        assert_eq!(result.frequency, "three_times_daily");
        assert_eq!(result.total_daily_dose, Some(1500.0));
        assert_eq!(result.route, "oral");
        assert!(result.warnings.is_empty());
        assert_eq!(result.audit.risk_level, RiskLevel::Low);
        assert_eq!(result.audit.checks_performed, CHECKS_PERFORMED.to_vec());
    }

    /// T-02: brand names resolve to the generic before lookup.
    #[test]
    fn brand_name_resolves_to_generic() {
        let reference = ReferenceData::load_test();
        let result = calculate_dosage(
            &request("Amoxil", adult(), "bacterial_infection"),
            &reference,
        )
        .unwrap();
        assert_eq!(result.medication, "amoxicillin");
        assert_eq!(result.dose_amount, 500.0);
    }

    #[test]
    fn unknown_medication_rejected() {
        let reference = ReferenceData::load_test();
        let err = calculate_dosage(&request("floopazine", adult(), "pain"), &reference)
            .unwrap_err();
        assert!(matches!(err, DosageError::UnknownMedication { .. }));
    }

    #[test]
    fn unrecognized_indication_rejected() {
        let reference = ReferenceData::load_test();
        let err = calculate_dosage(&request("amoxicillin", adult(), "hypertension"), &reference)
            .unwrap_err();
        assert!(matches!(err, DosageError::InvalidIndication { .. }));
        assert!(err.to_string().contains("not a recognized indication"));
    }

    #[test]
    fn implausible_patient_rejected_first() {
        let reference = ReferenceData::load_test();
        let mut patient = adult();
        patient.age_years = 200;
        let err = calculate_dosage(
            &request("amoxicillin", patient, "bacterial_infection"),
            &reference,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid patient age"));
    }

    /// T-03: allergy always blocks, whether recorded as the drug itself or
    /// its family.
    #[test]
    fn allergy_blocks_direct_and_family_match() {
        let reference = ReferenceData::load_test();

        let mut patient = adult();
        patient.allergies = vec!["amoxicillin".into()];
        let err = calculate_dosage(
            &request("amoxicillin", patient, "bacterial_infection"),
            &reference,
        )
        .unwrap_err();
        assert!(matches!(err, DosageError::AllergyContraindication { .. }));

        let mut patient = adult();
        patient.allergies = vec!["penicillin".into()];
        let err = calculate_dosage(
            &request("amoxicillin", patient, "bacterial_infection"),
            &reference,
        )
        .unwrap_err();
        assert!(err.to_string().contains("allergic to penicillin"));
    }

    /// T-04: aspirin is refused outright for a child (Reye syndrome).
    #[test]
    fn pediatric_aspirin_hard_stop() {
        let reference = ReferenceData::load_test();
        let err = calculate_dosage(&request("aspirin", child(8, 25.0), "fever"), &reference)
            .unwrap_err();
        assert!(matches!(err, DosageError::AbsoluteContraindication { .. }));
        assert!(err.to_string().contains("Reye"));
    }

    /// T-05: pediatric acetaminophen doses by weight at the rule midpoint.
    #[test]
    fn pediatric_weight_based_dose() {
        let reference = ReferenceData::load_test();
        let result = calculate_dosage(&request("acetaminophen", child(8, 25.0), "fever"), &reference)
            .unwrap();

        // 12.5 mg/kg midpoint at 25 kg.
        assert_eq!(result.dose_amount, 312.5);
        assert_eq!(result.total_daily_dose, Some(1250.0));
        assert!(result.has_warning("pediatric_safety"));
        assert_eq!(result.audit.calculation_method, CalculationMethod::WeightBased);
    }

    #[test]
    fn pediatric_opioid_carries_safety_note() {
        let reference = ReferenceData::load_test();
        let result = calculate_dosage(&request("morphine", child(8, 25.0), "severe_pain"), &reference)
            .unwrap();

        // 0.075 mg/kg midpoint at 25 kg.
        assert!((result.dose_amount - 1.875).abs() < 1e-9);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.description.contains("respiratory depression")));
    }

    /// T-06: geriatric narrow-therapeutic-index drugs are halved.
    #[test]
    fn geriatric_reduction_for_narrow_index_drug() {
        let reference = ReferenceData::load_test();
        let result = calculate_dosage(&request("digoxin", geriatric(), "heart_failure"), &reference)
            .unwrap();

        assert_eq!(result.dose_amount, 125.0);
        assert_eq!(result.adjustment_factor("geriatric_reduction"), Some(0.5));
    }

    #[test]
    fn geriatric_beers_criteria_warning() {
        let reference = ReferenceData::load_test();
        let result = calculate_dosage(
            &request("diphenhydramine", geriatric(), "allergic_reaction"),
            &reference,
        )
        .unwrap();

        assert_eq!(result.dose_amount, 18.75);
        let beers = result
            .warnings
            .iter()
            .find(|w| w.warning_type == "beers_criteria")
            .unwrap();
        assert_eq!(beers.severity, FindingSeverity::High);
        assert!(beers.description.contains("inappropriate in elderly"));
    }

    #[test]
    fn renal_reduction_applies_in_pipeline() {
        let reference = ReferenceData::load_test();
        let mut patient = adult();
        patient.creatinine_clearance_ml_min = Some(25.0);
        let result = calculate_dosage(&request("atenolol", patient, "hypertension"), &reference)
            .unwrap();

        assert_eq!(result.dose_amount, 25.0);
        assert_eq!(result.adjustment_factor("renal_impairment"), Some(0.5));
        assert!(result.has_warning("renal_adjustment"));
    }

    /// T-07: nephrotoxic drug refused in severe renal impairment.
    #[test]
    fn nephrotoxic_drug_refused_in_renal_impairment() {
        let reference = ReferenceData::load_test();
        let mut patient = adult();
        patient.creatinine_clearance_ml_min = Some(25.0);
        let err = calculate_dosage(&request("ibuprofen", patient, "pain"), &reference).unwrap_err();
        assert!(err
            .to_string()
            .contains("NSAID contraindicated in severe renal impairment"));
    }

    #[test]
    fn hepatic_reduction_applies_in_pipeline() {
        let reference = ReferenceData::load_test();
        let mut patient = adult();
        patient.hepatic_function = HepaticFunction::Severe;
        let result = calculate_dosage(&request("propranolol", patient, "hypertension"), &reference)
            .unwrap();

        assert_eq!(result.dose_amount, 20.0);
        assert_eq!(result.adjustment_factor("hepatic_impairment"), Some(0.25));
    }

    /// T-08: high-dose acetaminophen refused in severe liver disease.
    #[test]
    fn hepatotoxic_high_dose_refused_in_liver_disease() {
        let reference = ReferenceData::load_test();
        let mut patient = adult();
        patient.hepatic_function = HepaticFunction::Severe;
        let err = calculate_dosage(&request("acetaminophen", patient, "pain"), &reference)
            .unwrap_err();
        assert!(err.to_string().contains("severe liver disease"));
    }

    /// T-09: a fatal class interaction blocks dosing outright.
    #[test]
    fn fatal_interaction_blocks_dosing() {
        let reference = ReferenceData::load_test();
        let mut patient = adult();
        patient.current_medications = vec!["diazepam 5mg nightly".into()];
        let err = calculate_dosage(&request("morphine", patient, "severe_pain"), &reference)
            .unwrap_err();

        match err {
            DosageError::FatalInteraction {
                medication,
                existing,
                interaction,
            } => {
                assert_eq!(medication, "morphine");
                assert_eq!(existing, "diazepam");
                assert_eq!(interaction, "respiratory_depression");
            }
            other => panic!("expected FatalInteraction, got {other:?}"),
        }
    }

    #[test]
    fn nonfatal_interaction_becomes_warning() {
        let reference = ReferenceData::load_test();
        let mut patient = adult();
        patient.current_medications = vec!["aspirin 81mg daily".into()];
        let result = calculate_dosage(
            &request("warfarin", patient, "atrial_fibrillation"),
            &reference,
        )
        .unwrap();

        let interaction = result
            .warnings
            .iter()
            .find(|w| w.warning_type == "drug_interaction")
            .unwrap();
        assert_eq!(interaction.severity, FindingSeverity::High);
        assert!(interaction.description.contains("bleeding_risk"));
        assert!(result.monitoring.iter().any(|m| m == "bleeding_signs"));
        assert_eq!(result.audit.risk_level, RiskLevel::High);
    }

    /// T-10: a clinician-entered dose above the toxic threshold is refused.
    #[test]
    fn toxic_dose_rejected() {
        let reference = ReferenceData::load_test();
        let mut req = request("digoxin", adult(), "heart_failure");
        req.requested_dose = Some(1000.0);
        let err = calculate_dosage(&req, &reference).unwrap_err();

        assert!(err.to_string().contains("Dose exceeds toxic level"));
        match err {
            DosageError::ToxicDose {
                dose,
                toxic_threshold,
                ..
            } => {
                assert_eq!(dose, 1000.0);
                assert_eq!(toxic_threshold, 750.0);
            }
            other => panic!("expected ToxicDose, got {other:?}"),
        }
    }

    #[test]
    fn oversized_dose_capped_below_toxic_threshold() {
        let reference = ReferenceData::load_test();
        let mut req = request("amoxicillin", adult(), "bacterial_infection");
        req.requested_dose = Some(1500.0);
        let result = calculate_dosage(&req, &reference).unwrap();

        assert_eq!(result.dose_amount, 1000.0);
        assert!(result.has_warning("dose_capped"));
    }

    #[test]
    fn schedule_two_drug_warns() {
        let reference = ReferenceData::load_test();
        let result = calculate_dosage(&request("fentanyl", adult(), "severe_pain"), &reference)
            .unwrap();

        let controlled = result
            .warnings
            .iter()
            .find(|w| w.warning_type == "controlled_substance")
            .unwrap();
        assert_eq!(controlled.severity, FindingSeverity::High);
        assert!(controlled.description.contains("Schedule II"));
    }

    /// T-11: sliding-scale insulin from glucose inputs.
    #[test]
    fn insulin_sliding_scale() {
        let reference = ReferenceData::load_test();
        let mut req = request("insulin", adult(), "hyperglycemia");
        req.current_blood_glucose_mg_dl = Some(300.0);
        req.insulin_sensitivity_factor = Some(50.0);
        let result = calculate_insulin_dosage(&req, &reference).unwrap();

        // (300 - 120) / 50 corrective units, plus 0.5 U/kg/day basal.
        assert!((result.dose_amount - 3.6).abs() < 1e-9);
        assert!((result.total_daily_dose.unwrap() - 38.6).abs() < 1e-9);
        assert_eq!(result.dose_unit, "units");
        assert!(result.has_warning("hypoglycemia_risk"));
        assert_eq!(
            result.audit.calculation_method,
            CalculationMethod::SlidingScale
        );
    }

    /// T-12: corrective insulin above the safety cap is refused.
    #[test]
    fn insulin_correction_cap() {
        let reference = ReferenceData::load_test();
        let mut req = request("insulin", adult(), "hyperglycemia");
        req.current_blood_glucose_mg_dl = Some(600.0);
        req.target_blood_glucose_mg_dl = Some(100.0);
        req.insulin_sensitivity_factor = Some(10.0);
        let err = calculate_insulin_dosage(&req, &reference).unwrap_err();

        assert!(err
            .to_string()
            .contains("insulin dose exceeds safety limits"));
    }

    #[test]
    fn insulin_below_target_withheld() {
        let reference = ReferenceData::load_test();
        let mut req = request("insulin", adult(), "hyperglycemia");
        req.current_blood_glucose_mg_dl = Some(80.0);
        let result = calculate_insulin_dosage(&req, &reference).unwrap();

        assert_eq!(result.dose_amount, 0.0);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.description.contains("withheld")));
    }

    #[test]
    fn insulin_requires_glucose_input() {
        let reference = ReferenceData::load_test();
        let err = calculate_insulin_dosage(&request("insulin", adult(), "hyperglycemia"), &reference)
            .unwrap_err();
        assert!(err.to_string().contains("blood glucose"));
    }

    /// T-13: cardiac-arrest epinephrine follows the protocol table.
    #[test]
    fn emergency_epinephrine_protocol() {
        let reference = ReferenceData::load_test();
        let result =
            calculate_emergency_dosage("epinephrine", "cardiac_arrest", &adult(), &reference)
                .unwrap();

        assert_eq!(result.dose_amount, 1.0);
        assert_eq!(result.route, "intravenous");
        assert_eq!(result.frequency, "every_3_minutes_prn");
        assert!(result.instructions.as_deref().unwrap().contains("saline flush"));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.description.contains("10 doses")));
        assert_eq!(result.audit.calculation_method, CalculationMethod::Protocol);
    }

    #[test]
    fn emergency_naloxone_protocol() {
        let reference = ReferenceData::load_test();
        let result =
            calculate_emergency_dosage("naloxone", "opioid_overdose", &adult(), &reference)
                .unwrap();
        assert_eq!(result.dose_amount, 0.4);
        assert_eq!(result.max_single_dose, 2.0);
    }

    /// T-14: emergency dosing never bypasses the allergy check.
    #[test]
    fn emergency_dosing_still_checks_allergy() {
        let reference = ReferenceData::load_test();
        let mut patient = adult();
        patient.allergies = vec!["epinephrine".into()];
        let err = calculate_emergency_dosage("epinephrine", "cardiac_arrest", &patient, &reference)
            .unwrap_err();
        assert!(matches!(err, DosageError::AllergyContraindication { .. }));
    }

    #[test]
    fn emergency_urgency_bypasses_renal_reduction() {
        let reference = ReferenceData::load_test();
        let mut patient = adult();
        patient.creatinine_clearance_ml_min = Some(25.0);
        let mut req = request("atenolol", patient, "hypertension");
        req.urgency = Urgency::Emergency;
        let result = calculate_dosage(&req, &reference).unwrap();

        assert_eq!(result.dose_amount, 50.0);
        assert!(result.adjustments.is_empty());
    }

    /// T-15: chemotherapy doses by body surface area.
    #[test]
    fn chemotherapy_bsa_dose() {
        let reference = ReferenceData::load_test();
        let result = calculate_chemotherapy_dosage(
            &request("doxorubicin", adult(), "lymphoma"),
            &reference,
        )
        .unwrap();

        let bsa = body_surface_area(70.0, 175.0);
        assert!(result.dose_amount >= 30.0 * bsa && result.dose_amount <= 60.0 * bsa);
        assert_eq!(result.audit.calculation_method, CalculationMethod::BsaBased);
        assert!(result.adjustment_factor("bsa_based").is_some());
    }

    #[test]
    fn specialized_entry_points_guard_population() {
        let reference = ReferenceData::load_test();

        let err = calculate_pediatric_dosage(
            &request("acetaminophen", adult(), "fever"),
            &reference,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Not a pediatric patient"));

        let err = calculate_geriatric_dosage(
            &request("digoxin", adult(), "heart_failure"),
            &reference,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Not a geriatric patient"));

        let err = calculate_chemotherapy_dosage(
            &request("amoxicillin", adult(), "bacterial_infection"),
            &reference,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not dosed by body surface area"));
    }

    #[test]
    fn warnings_ordered_by_descending_severity() {
        let reference = ReferenceData::load_test();
        let mut patient = geriatric();
        patient.current_medications = vec!["aspirin".into(), "simvastatin".into()];
        let result = calculate_dosage(
            &request("warfarin", patient, "atrial_fibrillation"),
            &reference,
        )
        .unwrap();

        assert!(result.warnings.len() >= 2);
        for pair in result.warnings.windows(2) {
            assert!(pair[0].severity >= pair[1].severity);
        }
    }

    /// T-16: identical requests produce identical clinical output.
    #[test]
    fn calculation_is_idempotent() {
        let reference = ReferenceData::load_test();
        let req = request("amoxicillin", adult(), "bacterial_infection");
        let first = calculate_dosage(&req, &reference).unwrap();
        let second = calculate_dosage(&req, &reference).unwrap();

        assert_eq!(first.dose_amount, second.dose_amount);
        assert_eq!(first.total_daily_dose, second.total_daily_dose);
        assert_eq!(first.warnings, second.warnings);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn prior_overdose_flag_warns() {
        let reference = ReferenceData::load_test();
        let mut req = request("morphine", adult(), "severe_pain");
        req.prior_overdose = true;
        let result = calculate_dosage(&req, &reference).unwrap();
        assert!(result.has_warning("overdose_history"));
    }
}
