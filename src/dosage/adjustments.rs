//! Organ-function dose adjustments. Reductions are data (`AppliedAdjustment`)
//! so callers can see how a final dose was reached; only the hard stops
//! (nephrotoxic drug in severe impairment, high-dose hepatotoxic drug in
//! severe liver disease) are errors.

use tracing::{debug, warn};

use crate::models::{FindingSeverity, HepaticFunction, PatientProfile, Sex};
use crate::reference::dosing::{DoseBasis, DosingRule};

use super::types::{AppliedAdjustment, DosageError, DosageWarning};
use super::units::doses_per_day;

/// Daily-dose ceiling (mg) above which a hepatotoxic drug is refused
/// outright in severe hepatic impairment.
const SEVERE_HEPATIC_DAILY_CAP_MG: f64 = 2000.0;

/// Outcome of a renal adjustment: the (possibly reduced) dose, an interval
/// override for drugs dosed by extended interval, and the applied reduction.
#[derive(Debug, Clone)]
pub struct RenalAdjustment {
    pub dose: f64,
    pub frequency_override: Option<String>,
    pub adjustment: Option<AppliedAdjustment>,
    pub warning: Option<DosageWarning>,
}

impl RenalAdjustment {
    fn unchanged(dose: f64) -> Self {
        Self {
            dose,
            frequency_override: None,
            adjustment: None,
            warning: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HepaticAdjustment {
    pub dose: f64,
    pub adjustment: Option<AppliedAdjustment>,
    pub warning: Option<DosageWarning>,
}

impl HepaticAdjustment {
    fn unchanged(dose: f64) -> Self {
        Self {
            dose,
            adjustment: None,
            warning: None,
        }
    }
}

/// Weight-based dose derived from a mg/kg rule.
#[derive(Debug, Clone, Copy)]
pub struct WeightBasedDose {
    pub per_dose: f64,
    pub per_day: f64,
    pub mg_per_kg: f64,
}

/// Cockcroft-Gault estimate, with the 0.85 correction for female patients.
/// A measured clearance on the profile always wins over the estimate.
pub fn estimate_creatinine_clearance(patient: &PatientProfile) -> Option<f64> {
    if let Some(measured) = patient.creatinine_clearance_ml_min {
        return Some(measured);
    }
    let serum_creatinine = patient.serum_creatinine_mg_dl?;
    if serum_creatinine <= 0.0 || patient.weight_kg <= 0.0 {
        return None;
    }
    let mut clearance =
        ((140.0 - f64::from(patient.age_years)) * patient.weight_kg) / (72.0 * serum_creatinine);
    if patient.sex == Sex::Female {
        clearance *= 0.85;
    }
    Some(clearance)
}

/// Mosteller body surface area in m².
pub fn body_surface_area(weight_kg: f64, height_cm: f64) -> f64 {
    ((height_cm * weight_kg) / 3600.0).sqrt()
}

fn class_label(drug_class: &str) -> String {
    match drug_class {
        "nsaid" => "NSAID".to_string(),
        other => other.replace('_', " "),
    }
}

/// Reduce a dose for impaired creatinine clearance.
///
/// Bands: ≥60 full dose; 36–59 → 75%; 15–35 → 50% with extended interval;
/// <15 → 50% with a high-severity warning. Nephrotoxic drugs below CrCl 30
/// are refused outright. Aminoglycosides extend to 24 h / 36 h intervals
/// instead of fractional dosing alone.
pub fn adjust_dosage_for_renal_function(
    rule: &DosingRule,
    dose: f64,
    creatinine_clearance: f64,
) -> Result<RenalAdjustment, DosageError> {
    if rule.nephrotoxic && creatinine_clearance < 30.0 {
        warn!(
            medication = %rule.generic_name,
            creatinine_clearance,
            "nephrotoxic medication refused in severe renal impairment",
        );
        return Err(DosageError::AbsoluteContraindication {
            medication: rule.generic_name.clone(),
            reason: format!(
                "{} contraindicated in severe renal impairment (CrCl {:.0} mL/min)",
                class_label(&rule.drug_class),
                creatinine_clearance
            ),
        });
    }

    if !rule.renal_clearance {
        if rule.nephrotoxic && creatinine_clearance < 60.0 {
            return Ok(RenalAdjustment {
                dose,
                frequency_override: None,
                adjustment: None,
                warning: Some(DosageWarning::new(
                    "renal_caution",
                    FindingSeverity::Moderate,
                    vec![rule.generic_name.clone()],
                    format!(
                        "Nephrotoxic medication with reduced renal function \
                         (CrCl {creatinine_clearance:.0} mL/min); prefer an alternative"
                    ),
                )),
            });
        }
        return Ok(RenalAdjustment::unchanged(dose));
    }

    if creatinine_clearance >= 60.0 {
        return Ok(RenalAdjustment::unchanged(dose));
    }

    let aminoglycoside = rule.drug_class.contains("aminoglycoside");
    let (factor, severity, reason, interval) = if creatinine_clearance >= 36.0 {
        (
            0.75,
            FindingSeverity::Moderate,
            "moderate_renal_impairment",
            aminoglycoside.then(|| "every_24_hours".to_string()),
        )
    } else if creatinine_clearance >= 15.0 {
        (
            0.5,
            FindingSeverity::High,
            "severe_renal_impairment",
            aminoglycoside.then(|| "every_36_hours".to_string()),
        )
    } else {
        (0.5, FindingSeverity::High, "renal_failure", None)
    };

    let adjusted = dose * factor;
    debug!(
        medication = %rule.generic_name,
        creatinine_clearance,
        factor,
        "renal dose reduction applied",
    );

    let description = match reason {
        "moderate_renal_impairment" => format!(
            "Dose reduced to 75% for moderate renal impairment \
             (CrCl {creatinine_clearance:.0} mL/min)"
        ),
        "severe_renal_impairment" => format!(
            "Dose reduced to 50% and dosing interval extended for severe renal \
             impairment (CrCl {creatinine_clearance:.0} mL/min)"
        ),
        _ => format!(
            "Dose reduced to 50% in renal failure (CrCl {creatinine_clearance:.0} mL/min); \
             nephrology consultation advised"
        ),
    };

    Ok(RenalAdjustment {
        dose: adjusted,
        frequency_override: interval,
        adjustment: Some(AppliedAdjustment {
            adjustment_type: "renal_impairment".into(),
            factor,
            reason: reason.into(),
        }),
        warning: Some(DosageWarning::new(
            "renal_adjustment",
            severity,
            vec![rule.generic_name.clone()],
            description,
        )),
    })
}

/// Reduce a dose for impaired hepatic function.
///
/// Mild impairment warns without reducing; Moderate halves and Severe
/// quarters hepatically-metabolized drugs. A hepatotoxic drug whose
/// requested daily total exceeds the severe-impairment cap is refused.
pub fn adjust_dosage_for_hepatic_function(
    rule: &DosingRule,
    dose: f64,
    requested_daily_dose: f64,
    hepatic_function: HepaticFunction,
) -> Result<HepaticAdjustment, DosageError> {
    if !rule.hepatic_metabolism && !rule.hepatotoxic {
        return Ok(HepaticAdjustment::unchanged(dose));
    }

    match hepatic_function {
        HepaticFunction::Normal => Ok(HepaticAdjustment::unchanged(dose)),
        HepaticFunction::Mild => Ok(HepaticAdjustment {
            dose,
            adjustment: None,
            warning: Some(DosageWarning::new(
                "hepatic_caution",
                FindingSeverity::Moderate,
                vec![rule.generic_name.clone()],
                "Hepatically metabolized; monitor liver function",
            )),
        }),
        HepaticFunction::Moderate => {
            if !rule.hepatic_metabolism {
                return Ok(HepaticAdjustment {
                    dose,
                    adjustment: None,
                    warning: Some(DosageWarning::new(
                        "hepatic_caution",
                        FindingSeverity::High,
                        vec![rule.generic_name.clone()],
                        "Hepatotoxic medication in moderate hepatic impairment",
                    )),
                });
            }
            debug!(medication = %rule.generic_name, factor = 0.5, "hepatic dose reduction applied");
            Ok(HepaticAdjustment {
                dose: dose * 0.5,
                adjustment: Some(AppliedAdjustment {
                    adjustment_type: "hepatic_impairment".into(),
                    factor: 0.5,
                    reason: "moderate_hepatic_impairment".into(),
                }),
                warning: Some(DosageWarning::new(
                    "hepatic_adjustment",
                    FindingSeverity::High,
                    vec![rule.generic_name.clone()],
                    "Dose reduced to 50% for moderate hepatic impairment",
                )),
            })
        }
        HepaticFunction::Severe => {
            if rule.hepatotoxic
                && rule.unit == "mg"
                && requested_daily_dose > SEVERE_HEPATIC_DAILY_CAP_MG
            {
                warn!(
                    medication = %rule.generic_name,
                    requested_daily_dose,
                    "hepatotoxic medication refused in severe hepatic impairment",
                );
                return Err(DosageError::AbsoluteContraindication {
                    medication: rule.generic_name.clone(),
                    reason: format!(
                        "High-dose {} contraindicated in severe liver disease",
                        rule.generic_name
                    ),
                });
            }
            if !rule.hepatic_metabolism {
                return Ok(HepaticAdjustment {
                    dose,
                    adjustment: None,
                    warning: Some(DosageWarning::new(
                        "hepatic_caution",
                        FindingSeverity::High,
                        vec![rule.generic_name.clone()],
                        "Hepatotoxic medication in severe hepatic impairment",
                    )),
                });
            }
            debug!(medication = %rule.generic_name, factor = 0.25, "hepatic dose reduction applied");
            Ok(HepaticAdjustment {
                dose: dose * 0.25,
                adjustment: Some(AppliedAdjustment {
                    adjustment_type: "hepatic_impairment".into(),
                    factor: 0.25,
                    reason: "severe_hepatic_impairment".into(),
                }),
                warning: Some(DosageWarning::new(
                    "hepatic_adjustment",
                    FindingSeverity::High,
                    vec![rule.generic_name.clone()],
                    "Dose reduced to 25% for severe hepatic impairment",
                )),
            })
        }
    }
}

/// Derive per-dose and per-day amounts from a mg/kg rule at the midpoint of
/// its range. Returns `None` for rules that are not weight-based. Range caps
/// are the calculator's responsibility.
pub fn adjust_dosage_for_weight(rule: &DosingRule, weight_kg: f64) -> Option<WeightBasedDose> {
    let DoseBasis::PerKg { low, high, per_day } = rule.basis else {
        return None;
    };
    let mg_per_kg = (low + high) / 2.0;
    let total = mg_per_kg * weight_kg;
    let administrations = doses_per_day(&rule.frequency);
    let (per_dose, per_day) = if per_day {
        (total / administrations, total)
    } else {
        (total, total * administrations)
    };
    Some(WeightBasedDose {
        per_dose,
        per_day,
        mg_per_kg,
    })
}
