use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{FindingSeverity, PatientProfile, RiskLevel, Urgency};

/// Checks every calculation performs, in the order they run. The audit
/// record always lists all four so downstream review can assert nothing
/// was skipped.
pub const CHECKS_PERFORMED: [&str; 4] = [
    "allergy_check",
    "interaction_check",
    "contraindication_check",
    "dosage_range_validation",
];

#[derive(Debug, Error)]
pub enum DosageError {
    #[error("{reason}")]
    InvalidPatient { reason: String },

    #[error("{indication} is not a recognized indication for {medication}")]
    InvalidIndication {
        medication: String,
        indication: String,
    },

    #[error("No dosing rule for medication: {name}")]
    UnknownMedication { name: String },

    /// Allergy matches are unconditional refusals; there is no override path.
    #[error("Patient allergic to {allergen}: {medication} is contraindicated")]
    AllergyContraindication { medication: String, allergen: String },

    /// Hard clinical stop (pediatric prohibition, renal or hepatic failure
    /// rule). Never overridable.
    #[error("{medication}: {reason}")]
    AbsoluteContraindication { medication: String, reason: String },

    #[error("Fatal drug interaction between {medication} and {existing}: {interaction}")]
    FatalInteraction {
        medication: String,
        existing: String,
        interaction: String,
    },

    #[error("Dose exceeds toxic level: {dose} {unit} (toxic at {toxic_threshold} {unit})")]
    ToxicDose {
        dose: f64,
        toxic_threshold: f64,
        unit: String,
    },

    #[error("{reason}")]
    UnsafeDose { reason: String },

    #[error("Cannot convert between {from} and {to}")]
    UnitConversion { from: String, to: String },
}

/// One dosage calculation request. Glucose fields are only read for
/// sliding-scale (insulin) rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DosageRequest {
    pub medication: String,
    pub patient: PatientProfile,
    pub indication: String,
    pub urgency: Urgency,
    /// Clinician-entered dose to validate instead of the table's standard
    /// dose, in the rule's unit. Still subject to every check.
    pub requested_dose: Option<f64>,
    pub current_blood_glucose_mg_dl: Option<f64>,
    pub target_blood_glucose_mg_dl: Option<f64>,
    pub insulin_sensitivity_factor: Option<f64>,
    pub prior_overdose: bool,
}

impl DosageRequest {
    pub fn routine(
        medication: impl Into<String>,
        patient: PatientProfile,
        indication: impl Into<String>,
    ) -> Self {
        Self {
            medication: medication.into(),
            patient,
            indication: indication.into(),
            urgency: Urgency::Routine,
            requested_dose: None,
            current_blood_glucose_mg_dl: None,
            target_blood_glucose_mg_dl: None,
            insulin_sensitivity_factor: None,
            prior_overdose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosageWarning {
    pub warning_type: String,
    pub severity: FindingSeverity,
    pub affected_drugs: Vec<String>,
    pub description: String,
}

impl DosageWarning {
    pub fn new(
        warning_type: impl Into<String>,
        severity: FindingSeverity,
        affected_drugs: Vec<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            warning_type: warning_type.into(),
            severity,
            affected_drugs,
            description: description.into(),
        }
    }
}

/// A dose reduction that was applied, kept as data so the caller can see
/// exactly how the final number was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedAdjustment {
    pub adjustment_type: String,
    pub factor: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    Fixed,
    WeightBased,
    BsaBased,
    SlidingScale,
    Protocol,
}

impl CalculationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            CalculationMethod::Fixed => "fixed",
            CalculationMethod::WeightBased => "weight_based",
            CalculationMethod::BsaBased => "bsa_based",
            CalculationMethod::SlidingScale => "sliding_scale",
            CalculationMethod::Protocol => "protocol",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub timestamp: NaiveDateTime,
    pub calculation_method: CalculationMethod,
    pub checks_performed: Vec<String>,
    pub risk_level: RiskLevel,
}

impl AuditRecord {
    pub fn new(calculation_method: CalculationMethod, risk_level: RiskLevel) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now().naive_utc(),
            calculation_method,
            checks_performed: CHECKS_PERFORMED.iter().map(|c| c.to_string()).collect(),
            risk_level,
        }
    }
}

/// Outcome of a successful calculation. Results are immutable: a changed
/// patient state means a new calculation, never a patched result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DosageResult {
    pub id: Uuid,
    /// Resolved generic name (brand input is normalized before lookup).
    pub medication: String,
    pub dose_amount: f64,
    pub dose_unit: String,
    pub frequency: String,
    pub route: String,
    pub duration: Option<String>,
    /// Absent for protocol dosing, where repetition is event-driven.
    pub total_daily_dose: Option<f64>,
    pub max_single_dose: f64,
    /// Administration notes from emergency protocols.
    pub instructions: Option<String>,
    /// Ordered by descending severity.
    pub warnings: Vec<DosageWarning>,
    pub monitoring: Vec<String>,
    pub adjustments: Vec<AppliedAdjustment>,
    pub audit: AuditRecord,
}

impl DosageResult {
    pub fn has_warning(&self, warning_type: &str) -> bool {
        self.warnings.iter().any(|w| w.warning_type == warning_type)
    }

    pub fn adjustment_factor(&self, adjustment_type: &str) -> Option<f64> {
        self.adjustments
            .iter()
            .find(|a| a.adjustment_type == adjustment_type)
            .map(|a| a.factor)
    }
}
