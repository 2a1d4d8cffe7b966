pub mod enums;
pub mod medication;
pub mod patient;
pub mod vitals;

pub use enums::{
    AgeClass, ConditionSeverity, ConsciousnessLevel, FindingSeverity, HepaticFunction, RiskLevel,
    Sex, Urgency,
};
pub use medication::{MedicationProfile, TherapeuticRange};
pub use patient::{PatientDemographics, PatientProfile};
pub use vitals::VitalSigns;
