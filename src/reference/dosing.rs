use serde::{Deserialize, Serialize};

/// How a dose is derived from the rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DoseBasis {
    /// Standard fixed dose per administration.
    Fixed,
    /// Weight-based dosing in unit/kg. `per_day` rules express a daily
    /// total to be divided across administrations.
    PerKg { low: f64, high: f64, per_day: bool },
    /// Body-surface-area dosing in unit/m² (chemotherapy).
    PerM2 { low: f64, high: f64 },
    /// Insulin sliding scale; dose derived from glucose inputs.
    SlidingScale,
    /// Emergency protocol dosing; see the protocol table.
    Protocol,
}

/// Pediatric dosing constraints for a medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PediatricRule {
    /// Below this age the drug is contraindicated outright.
    pub min_age_years: Option<u32>,
    pub contraindication_reason: Option<String>,
    pub dose_per_kg_low: Option<f64>,
    pub dose_per_kg_high: Option<f64>,
    pub max_doses_per_day: Option<u32>,
    /// Absolute per-administration cap regardless of weight.
    pub max_single_dose: Option<f64>,
    pub safety_note: Option<String>,
}

/// Dosing knowledge for one medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosingRule {
    pub generic_name: String,
    pub drug_class: String,
    pub basis: DoseBasis,
    /// Standard adult dose per administration (Fixed basis).
    pub standard_dose: Option<f64>,
    pub min_single_dose: f64,
    pub max_single_dose: f64,
    pub max_daily_dose: f64,
    /// Above this, the computed dose is invalid outright.
    pub toxic_dose: Option<f64>,
    pub unit: String,
    pub frequency: String,
    pub route: String,
    pub duration: Option<String>,
    pub indications: Vec<String>,
    pub pediatric: Option<PediatricRule>,
    pub narrow_therapeutic_index: bool,
    pub nephrotoxic: bool,
    pub hepatotoxic: bool,
    pub hepatic_metabolism: bool,
    pub renal_clearance: bool,
    pub monitoring: Vec<String>,
}

impl DosingRule {
    pub fn has_indication(&self, indication: &str) -> bool {
        let lower = indication.to_lowercase();
        self.indications.iter().any(|i| i.to_lowercase() == lower)
    }
}

/// Brand-to-generic medication mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationAlias {
    pub generic_name: String,
    pub brand_name: String,
}

/// Pharmacological family grouping for cross-allergy detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugFamily {
    pub family: String,
    pub members: Vec<String>,
}

/// Beers-criteria style entry: potentially inappropriate in elderly patients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeersEntry {
    pub generic_name: String,
    pub concern: String,
}

/// Controlled-substance schedule assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlledSubstance {
    pub generic_name: String,
    pub schedule: String,
}

/// Protocol dosing for code situations (cardiac arrest, opioid overdose).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyDoseProtocol {
    pub generic_name: String,
    pub indication: String,
    pub dose: f64,
    pub dose_max: Option<f64>,
    pub unit: String,
    pub route: String,
    pub frequency: String,
    pub max_doses: Option<u32>,
    pub instructions: Option<String>,
}

/// Insulin sliding-scale policy constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsulinPolicy {
    pub basal_units_per_kg_day: f64,
    /// Corrective doses above this are rejected as unsafe.
    pub correction_cap_units: f64,
}

/// The dosing knowledge table of a reference snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DosingTable {
    pub rules: Vec<DosingRule>,
    pub aliases: Vec<MedicationAlias>,
    pub families: Vec<DrugFamily>,
    pub beers_list: Vec<BeersEntry>,
    pub controlled_substances: Vec<ControlledSubstance>,
    pub emergency_protocols: Vec<EmergencyDoseProtocol>,
    pub insulin: InsulinPolicy,
}

impl DosingTable {
    /// Resolve a (possibly brand) name to its lowercase generic name.
    pub fn resolve_generic(&self, name: &str) -> String {
        let lower = name.to_lowercase();
        self.aliases
            .iter()
            .find(|a| a.brand_name.to_lowercase() == lower)
            .map(|a| a.generic_name.to_lowercase())
            .unwrap_or(lower)
    }

    pub fn rule(&self, generic_name: &str) -> Option<&DosingRule> {
        let lower = generic_name.to_lowercase();
        self.rules.iter().find(|r| r.generic_name == lower)
    }

    /// Best-known drug class for a generic name: the dosing rule's class, or
    /// the containing family for drugs known only by family membership.
    pub fn drug_class_of(&self, generic_name: &str) -> Option<String> {
        if let Some(rule) = self.rule(generic_name) {
            return Some(rule.drug_class.clone());
        }
        let lower = generic_name.to_lowercase();
        self.families
            .iter()
            .find(|f| f.members.iter().any(|m| m.to_lowercase() == lower))
            .map(|f| f.family.clone())
    }

    /// Family shared by two substances, if any. Matching is by membership,
    /// including the family name itself (an allergy recorded as
    /// "penicillin" matches the penicillin family).
    pub fn shared_family(&self, a: &str, b: &str) -> Option<&str> {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        self.families
            .iter()
            .find(|f| {
                let in_family = |name: &str| {
                    f.family.eq_ignore_ascii_case(name)
                        || f.members.iter().any(|m| m.eq_ignore_ascii_case(name))
                };
                in_family(&a) && in_family(&b)
            })
            .map(|f| f.family.as_str())
    }

    pub fn beers_concern(&self, generic_name: &str) -> Option<&str> {
        let lower = generic_name.to_lowercase();
        self.beers_list
            .iter()
            .find(|b| b.generic_name == lower)
            .map(|b| b.concern.as_str())
    }

    pub fn schedule(&self, generic_name: &str) -> Option<&str> {
        let lower = generic_name.to_lowercase();
        self.controlled_substances
            .iter()
            .find(|c| c.generic_name == lower)
            .map(|c| c.schedule.as_str())
    }

    pub fn emergency_protocol(
        &self,
        generic_name: &str,
        indication: &str,
    ) -> Option<&EmergencyDoseProtocol> {
        let name = generic_name.to_lowercase();
        let ind = indication.to_lowercase();
        self.emergency_protocols
            .iter()
            .find(|p| p.generic_name == name && p.indication == ind)
    }
}
