pub mod adjustments;
pub mod calculator;
pub mod types;
pub mod units;

pub use adjustments::{
    adjust_dosage_for_hepatic_function, adjust_dosage_for_renal_function,
    adjust_dosage_for_weight, body_surface_area, estimate_creatinine_clearance,
};
pub use calculator::{
    calculate_chemotherapy_dosage, calculate_dosage, calculate_emergency_dosage,
    calculate_geriatric_dosage, calculate_insulin_dosage, calculate_pediatric_dosage,
};
pub use types::{
    AppliedAdjustment, AuditRecord, CalculationMethod, DosageError, DosageRequest, DosageResult,
    DosageWarning,
};
pub use units::convert_dosage_units;
