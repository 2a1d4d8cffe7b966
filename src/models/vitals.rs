use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::ConsciousnessLevel;

/// A timestamped vital-signs snapshot. Fields are optional because intake
/// devices report partial sets; completeness is scored, not rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    pub recorded_at: NaiveDateTime,
    pub systolic_bp: Option<f64>,
    pub diastolic_bp: Option<f64>,
    pub heart_rate: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub temperature_c: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub pain_score: Option<u8>,
    pub consciousness: Option<ConsciousnessLevel>,
}

impl VitalSigns {
    /// Core fields expected on a complete snapshot (pain score is optional
    /// by design and excluded from completeness).
    pub const CORE_FIELDS: [&'static str; 6] = [
        "systolic_bp",
        "diastolic_bp",
        "heart_rate",
        "respiratory_rate",
        "temperature_c",
        "oxygen_saturation",
    ];

    /// Names of core fields absent from this snapshot.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.systolic_bp.is_none() {
            missing.push("systolic_bp");
        }
        if self.diastolic_bp.is_none() {
            missing.push("diastolic_bp");
        }
        if self.heart_rate.is_none() {
            missing.push("heart_rate");
        }
        if self.respiratory_rate.is_none() {
            missing.push("respiratory_rate");
        }
        if self.temperature_c.is_none() {
            missing.push("temperature_c");
        }
        if self.oxygen_saturation.is_none() {
            missing.push("oxygen_saturation");
        }
        missing
    }

    /// Ratio of present core fields to expected core fields.
    pub fn completeness_score(&self) -> f64 {
        let present = Self::CORE_FIELDS.len() - self.missing_fields().len();
        present as f64 / Self::CORE_FIELDS.len() as f64
    }
}
