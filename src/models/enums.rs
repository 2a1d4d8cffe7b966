use serde::{Deserialize, Serialize};

/// Patient sex as used by dosing formulas (Cockcroft-Gault correction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

/// Hepatic function tier, from clinical assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HepaticFunction {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl HepaticFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            HepaticFunction::Normal => "normal",
            HepaticFunction::Mild => "mild",
            HepaticFunction::Moderate => "moderate",
            HepaticFunction::Severe => "severe",
        }
    }
}

/// Urgency of a dosage request. Emergency requests use protocol dosing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Routine,
    Urgent,
    Emergency,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Routine => "routine",
            Urgency::Urgent => "urgent",
            Urgency::Emergency => "emergency",
        }
    }
}

/// Severity of an interaction finding or dosage warning.
/// Ordering is clinical: Minor < Moderate < High < Fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    Minor,
    Moderate,
    High,
    Fatal,
}

impl FindingSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingSeverity::Minor => "minor",
            FindingSeverity::Moderate => "moderate",
            FindingSeverity::High => "high",
            FindingSeverity::Fatal => "fatal",
        }
    }
}

/// Overall risk level attached to audit records and compliance findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Severity of a derived emergency condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionSeverity {
    Low,
    Medium,
    High,
    Critical,
    LifeThreatening,
}

impl ConditionSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionSeverity::Low => "low",
            ConditionSeverity::Medium => "medium",
            ConditionSeverity::High => "high",
            ConditionSeverity::Critical => "critical",
            ConditionSeverity::LifeThreatening => "life_threatening",
        }
    }
}

/// AVPU consciousness scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsciousnessLevel {
    Alert,
    Voice,
    Pain,
    Unresponsive,
}

impl ConsciousnessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsciousnessLevel::Alert => "alert",
            ConsciousnessLevel::Voice => "voice",
            ConsciousnessLevel::Pain => "pain",
            ConsciousnessLevel::Unresponsive => "unresponsive",
        }
    }
}

/// Age class selecting reference bands and dosing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeClass {
    Neonate,
    Pediatric,
    Adult,
    Geriatric,
}

impl AgeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            AgeClass::Neonate => "neonate",
            AgeClass::Pediatric => "pediatric",
            AgeClass::Adult => "adult",
            AgeClass::Geriatric => "geriatric",
        }
    }

    /// Classify by age in years. Neonates (<28 days) must be classified
    /// from age in days by the caller; by whole years, age 0 is Pediatric.
    pub fn from_age_years(age: u32) -> Self {
        match age {
            0..=15 => AgeClass::Pediatric,
            16..=64 => AgeClass::Adult,
            _ => AgeClass::Geriatric,
        }
    }
}
