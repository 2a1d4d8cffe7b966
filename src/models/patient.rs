use serde::{Deserialize, Serialize};

use super::enums::{AgeClass, HepaticFunction, Sex};

/// Plausible bounds for patient physiology. Outside these, input is rejected
/// before any clinical logic runs.
pub const AGE_YEARS_MAX: u32 = 130;
pub const WEIGHT_KG_MIN: f64 = 0.5;
pub const WEIGHT_KG_MAX: f64 = 500.0;
pub const HEIGHT_CM_MIN: f64 = 20.0;
pub const HEIGHT_CM_MAX: f64 = 280.0;

/// Full patient profile consumed by the dosage calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub age_years: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub sex: Sex,
    pub serum_creatinine_mg_dl: Option<f64>,
    pub creatinine_clearance_ml_min: Option<f64>,
    pub hepatic_function: HepaticFunction,
    pub allergies: Vec<String>,
    pub current_medications: Vec<String>,
    pub conditions: Vec<String>,
    pub pregnant: bool,
}

impl PatientProfile {
    pub fn age_class(&self) -> AgeClass {
        AgeClass::from_age_years(self.age_years)
    }

    /// First physiological plausibility violation, as a human-readable reason.
    pub fn plausibility_issue(&self) -> Option<String> {
        if self.age_years > AGE_YEARS_MAX {
            return Some(format!(
                "Invalid patient age: {} years (plausible range 0-{})",
                self.age_years, AGE_YEARS_MAX,
            ));
        }
        if !(WEIGHT_KG_MIN..=WEIGHT_KG_MAX).contains(&self.weight_kg) {
            return Some(format!(
                "Invalid patient weight: {} kg (plausible range {}-{} kg)",
                self.weight_kg, WEIGHT_KG_MIN, WEIGHT_KG_MAX,
            ));
        }
        if !(HEIGHT_CM_MIN..=HEIGHT_CM_MAX).contains(&self.height_cm) {
            return Some(format!(
                "Invalid patient height: {} cm (plausible range {}-{} cm)",
                self.height_cm, HEIGHT_CM_MIN, HEIGHT_CM_MAX,
            ));
        }
        None
    }

    /// Case-insensitive allergy membership test.
    pub fn is_allergic_to(&self, substance: &str) -> bool {
        let lower = substance.to_lowercase();
        self.allergies.iter().any(|a| a.to_lowercase() == lower)
    }

    /// Case-insensitive condition membership test.
    pub fn has_condition(&self, condition: &str) -> bool {
        let lower = condition.to_lowercase();
        self.conditions.iter().any(|c| c.to_lowercase() == lower)
    }
}

/// Demographics consumed by the vital-signs validator. Lighter than the full
/// profile: triage often has no medication history yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDemographics {
    pub age_years: u32,
    pub sex: Sex,
    pub pregnant: bool,
    pub gestational_trimester: Option<u8>,
    pub weight_kg: Option<f64>,
    pub frailty_score: Option<u8>,
    pub known_conditions: Vec<String>,
}

impl PatientDemographics {
    pub fn age_class(&self) -> AgeClass {
        AgeClass::from_age_years(self.age_years)
    }

    pub fn adult(age_years: u32, sex: Sex) -> Self {
        Self {
            age_years,
            sex,
            pregnant: false,
            gestational_trimester: None,
            weight_kg: None,
            frailty_score: None,
            known_conditions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_profile() -> PatientProfile {
        PatientProfile {
            age_years: 35,
            weight_kg: 70.0,
            height_cm: 175.0,
            sex: Sex::Male,
            serum_creatinine_mg_dl: Some(1.0),
            creatinine_clearance_ml_min: Some(90.0),
            hepatic_function: HepaticFunction::Normal,
            allergies: vec![],
            current_medications: vec![],
            conditions: vec![],
            pregnant: false,
        }
    }

    #[test]
    fn plausible_profile_has_no_issue() {
        assert!(standard_profile().plausibility_issue().is_none());
    }

    #[test]
    fn implausible_weight_rejected() {
        let mut p = standard_profile();
        p.weight_kg = 0.1;
        let issue = p.plausibility_issue().unwrap();
        assert!(issue.contains("Invalid patient weight"));
    }

    #[test]
    fn implausible_age_rejected() {
        let mut p = standard_profile();
        p.age_years = 200;
        let issue = p.plausibility_issue().unwrap();
        assert!(issue.contains("Invalid patient age"));
    }

    #[test]
    fn allergy_match_is_case_insensitive() {
        let mut p = standard_profile();
        p.allergies = vec!["Penicillin".into()];
        assert!(p.is_allergic_to("penicillin"));
        assert!(p.is_allergic_to("PENICILLIN"));
        assert!(!p.is_allergic_to("ibuprofen"));
    }
}
