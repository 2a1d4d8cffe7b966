//! Vital-signs validation: plausibility bounds, band classification,
//! emergency detection, early-warning scoring, trend prediction, and
//! alert generation.

pub mod alerts;
pub mod emergency;
pub mod scoring;
pub mod trend;
pub mod types;
pub mod validator;

pub use alerts::{generate_vital_signs_alert, AlertLevel, VitalsAlert, SUPPRESSION_WINDOW_MINUTES};
pub use emergency::detect_emergency_conditions;
pub use scoring::{calculate_vital_signs_score, ScoreRisk, VitalSignsScore};
pub use trend::{predict_deterioration_risk, DeteriorationRisk, TrendDirection};
pub use types::{
    AdvisoryFinding, EmergencyFinding, OverallStatus, SignAssessment, VitalCategory,
    VitalSignsValidation, VitalsError,
};
pub use validator::{categorize_vital_signs, mean_arterial_pressure, validate_vital_signs};
