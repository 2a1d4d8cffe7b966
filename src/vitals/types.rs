use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ConditionSeverity;
use crate::reference::vitals::EmergencyRule;

/// Physiologically impossible input. Distinct from a clinical emergency: an
/// SpO2 of 120% is a data error, an SpO2 of 80% is a patient in trouble.
#[derive(Debug, Error)]
pub enum VitalsError {
    #[error("{field} value {value} is outside the physiologically possible range {min}-{max}")]
    ImpossibleValue {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Per-sign classification against the selected reference band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalCategory {
    Low,
    Normal,
    Elevated,
    High,
    Critical,
}

impl VitalCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            VitalCategory::Low => "low",
            VitalCategory::Normal => "normal",
            VitalCategory::Elevated => "elevated",
            VitalCategory::High => "high",
            VitalCategory::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Normal,
    Abnormal,
    Critical,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Normal => "normal",
            OverallStatus::Abnormal => "abnormal",
            OverallStatus::Critical => "critical",
        }
    }
}

/// One vital sign classified against its band, with a clinical label
/// (e.g. "low_grade_fever", "elevated").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignAssessment {
    pub field: &'static str,
    pub value: f64,
    pub category: VitalCategory,
    pub label: &'static str,
}

/// A named emergency derived from the snapshot's response table, with the
/// triggering values attached for the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyFinding {
    pub condition: String,
    pub severity: ConditionSeverity,
    pub time_to_intervention: String,
    pub interventions: Vec<String>,
    pub complications: Vec<String>,
    pub possible_causes: Vec<String>,
    pub trigger: String,
}

impl EmergencyFinding {
    pub(crate) fn from_rule(rule: &EmergencyRule, trigger: String) -> Self {
        Self {
            condition: rule.condition.clone(),
            severity: rule.severity,
            time_to_intervention: rule.time_to_intervention.clone(),
            interventions: rule.interventions.clone(),
            complications: rule.complications.clone(),
            possible_causes: rule.possible_causes.clone(),
            trigger,
        }
    }
}

/// Coherence and perfusion observations that do not cross a threshold on
/// their own but deserve clinical attention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryFinding {
    pub code: String,
    pub detail: String,
}

/// Full validation verdict for one vital-signs snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct VitalSignsValidation {
    pub id: Uuid,
    /// Which reference band classified this snapshot (e.g. "adult",
    /// "pregnancy", "neonate").
    pub band_label: String,
    pub overall_status: OverallStatus,
    pub assessments: Vec<SignAssessment>,
    pub emergencies: Vec<EmergencyFinding>,
    pub advisories: Vec<AdvisoryFinding>,
    pub mean_arterial_pressure: Option<f64>,
    pub missing_values: Vec<&'static str>,
    pub completeness_score: f64,
    pub requires_intervention: bool,
}

impl VitalSignsValidation {
    pub fn has_emergency(&self, condition: &str) -> bool {
        self.emergencies.iter().any(|e| e.condition == condition)
    }

    pub fn assessment(&self, field: &str) -> Option<&SignAssessment> {
        self.assessments.iter().find(|a| a.field == field)
    }

    pub fn has_advisory(&self, code: &str) -> bool {
        self.advisories.iter().any(|a| a.code == code)
    }
}
