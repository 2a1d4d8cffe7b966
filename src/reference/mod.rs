//! Versioned clinical reference-data snapshot.
//!
//! All four analyzers take `&ReferenceData` explicitly — there is no global
//! table. A running service loads one snapshot at startup, shares it behind
//! an `Arc`, and deploys table updates by loading a new snapshot and
//! swapping the `Arc` atomically; tables are never mutated in place.

pub mod compliance;
pub mod dosing;
pub mod interactions;
pub mod vitals;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ConditionSeverity, FindingSeverity};

pub use compliance::{CompliancePolicy, PurposeFields, RolePermission};
pub use dosing::{
    BeersEntry, ControlledSubstance, DoseBasis, DosingRule, DosingTable, DrugFamily,
    EmergencyDoseProtocol, InsulinPolicy, MedicationAlias, PediatricRule,
};
pub use interactions::{
    ClassInteractionRule, ConditionContraindication, InteractionMechanism, InteractionRule,
    InteractionTable, Onset,
};
pub use vitals::{EmergencyRule, VitalBand, VitalBandSet, VitalReference};

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("failed to read reference table {path}: {detail}")]
    Load { path: String, detail: String },
    #[error("failed to parse reference table {file}: {detail}")]
    Parse { file: String, detail: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotManifest {
    version: String,
}

/// One immutable snapshot of all clinical knowledge tables.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub version: String,
    pub dosing: DosingTable,
    pub interactions: InteractionTable,
    pub vitals: VitalReference,
    pub compliance: CompliancePolicy,
}

fn load_table<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T, ReferenceError> {
    let path = dir.join(file);
    let json = std::fs::read_to_string(&path).map_err(|e| ReferenceError::Load {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    serde_json::from_str(&json).map_err(|e| ReferenceError::Parse {
        file: file.to_string(),
        detail: e.to_string(),
    })
}

impl ReferenceData {
    /// Load a snapshot from a directory of JSON tables.
    pub fn load(dir: &Path) -> Result<Self, ReferenceError> {
        let manifest: SnapshotManifest = load_table(dir, "snapshot.json")?;
        let dosing: DosingTable = load_table(dir, "dosing.json")?;
        let mut interactions: InteractionTable = load_table(dir, "interactions.json")?;
        interactions.build_index();
        let vitals: VitalReference = load_table(dir, "vital_bands.json")?;
        let compliance: CompliancePolicy = load_table(dir, "compliance.json")?;

        tracing::info!(
            version = %manifest.version,
            dosing_rules = dosing.rules.len(),
            interaction_rules = interactions.pair_rules.len() + interactions.class_rules.len(),
            vital_bands = vitals.bands.len(),
            "reference snapshot loaded",
        );

        Ok(Self {
            version: manifest.version,
            dosing,
            interactions,
            vitals,
            compliance,
        })
    }

    /// In-memory snapshot for tests (no file I/O). The content mirrors a
    /// small production snapshot and is shared by every analyzer's tests.
    pub fn load_test() -> Self {
        Self {
            version: "test-2026.08".into(),
            dosing: test_dosing_table(),
            interactions: test_interaction_table(),
            vitals: test_vital_reference(),
            compliance: test_compliance_policy(),
        }
    }
}

// ---------------------------------------------------------------------------
// Test snapshot content
// ---------------------------------------------------------------------------

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn test_dosing_table() -> DosingTable {
    let rule = |generic: &str, class: &str| DosingRule {
        generic_name: generic.into(),
        drug_class: class.into(),
        basis: DoseBasis::Fixed,
        standard_dose: None,
        min_single_dose: 0.0,
        max_single_dose: 0.0,
        max_daily_dose: 0.0,
        toxic_dose: None,
        unit: "mg".into(),
        frequency: "once_daily".into(),
        route: "oral".into(),
        duration: None,
        indications: Vec::new(),
        pediatric: None,
        narrow_therapeutic_index: false,
        nephrotoxic: false,
        hepatotoxic: false,
        hepatic_metabolism: false,
        renal_clearance: false,
        monitoring: Vec::new(),
    };

    let rules = vec![
        DosingRule {
            standard_dose: Some(500.0),
            min_single_dose: 250.0,
            max_single_dose: 1000.0,
            max_daily_dose: 3000.0,
            frequency: "three_times_daily".into(),
            duration: Some("7_days".into()),
            indications: strings(&["bacterial_infection", "otitis_media", "sinusitis"]),
            renal_clearance: true,
            ..rule("amoxicillin", "penicillin_antibiotic")
        },
        DosingRule {
            basis: DoseBasis::PerKg {
                low: 15.0,
                high: 20.0,
                per_day: true,
            },
            min_single_dose: 500.0,
            max_single_dose: 2000.0,
            max_daily_dose: 4000.0,
            frequency: "every_12_hours".into(),
            route: "intravenous".into(),
            indications: strings(&["severe_infection", "mrsa_infection"]),
            narrow_therapeutic_index: true,
            nephrotoxic: true,
            renal_clearance: true,
            monitoring: strings(&["serum_trough_level", "renal_function"]),
            ..rule("vancomycin", "glycopeptide_antibiotic")
        },
        DosingRule {
            standard_dose: Some(250.0),
            min_single_dose: 125.0,
            max_single_dose: 500.0,
            max_daily_dose: 500.0,
            toxic_dose: Some(750.0),
            unit: "mcg".into(),
            indications: strings(&["heart_failure", "atrial_fibrillation"]),
            narrow_therapeutic_index: true,
            renal_clearance: true,
            monitoring: strings(&["serum_digoxin_level", "electrolytes"]),
            ..rule("digoxin", "cardiac_glycoside")
        },
        DosingRule {
            standard_dose: Some(650.0),
            min_single_dose: 325.0,
            max_single_dose: 1000.0,
            max_daily_dose: 4000.0,
            frequency: "every_6_hours".into(),
            indications: strings(&["pain", "fever"]),
            pediatric: Some(PediatricRule {
                min_age_years: None,
                contraindication_reason: None,
                dose_per_kg_low: Some(10.0),
                dose_per_kg_high: Some(15.0),
                max_doses_per_day: Some(4),
                max_single_dose: Some(1000.0),
                safety_note: None,
            }),
            hepatotoxic: true,
            hepatic_metabolism: true,
            ..rule("acetaminophen", "analgesic_antipyretic")
        },
        DosingRule {
            standard_dose: Some(325.0),
            min_single_dose: 81.0,
            max_single_dose: 650.0,
            max_daily_dose: 4000.0,
            frequency: "every_6_hours".into(),
            indications: strings(&["pain", "fever", "antiplatelet_therapy"]),
            pediatric: Some(PediatricRule {
                min_age_years: Some(16),
                contraindication_reason: Some("Reye syndrome risk".into()),
                dose_per_kg_low: None,
                dose_per_kg_high: None,
                max_doses_per_day: None,
                max_single_dose: None,
                safety_note: None,
            }),
            nephrotoxic: true,
            ..rule("aspirin", "nsaid")
        },
        DosingRule {
            standard_dose: Some(400.0),
            min_single_dose: 200.0,
            max_single_dose: 800.0,
            max_daily_dose: 3200.0,
            frequency: "every_6_hours".into(),
            indications: strings(&["pain", "fever", "inflammation"]),
            pediatric: Some(PediatricRule {
                min_age_years: None,
                contraindication_reason: None,
                dose_per_kg_low: Some(5.0),
                dose_per_kg_high: Some(10.0),
                max_doses_per_day: Some(4),
                max_single_dose: Some(400.0),
                safety_note: None,
            }),
            nephrotoxic: true,
            ..rule("ibuprofen", "nsaid")
        },
        DosingRule {
            standard_dose: Some(5.0),
            min_single_dose: 1.0,
            max_single_dose: 10.0,
            max_daily_dose: 40.0,
            frequency: "every_4_hours".into(),
            route: "intravenous".into(),
            indications: strings(&["severe_pain", "acute_pain"]),
            pediatric: Some(PediatricRule {
                min_age_years: None,
                contraindication_reason: None,
                dose_per_kg_low: Some(0.05),
                dose_per_kg_high: Some(0.1),
                max_doses_per_day: Some(6),
                max_single_dose: Some(4.0),
                safety_note: Some("Monitor respiratory depression closely".into()),
            }),
            hepatic_metabolism: true,
            monitoring: strings(&["respiratory_rate", "sedation_score"]),
            ..rule("morphine", "opioid")
        },
        DosingRule {
            basis: DoseBasis::PerM2 {
                low: 30.0,
                high: 60.0,
            },
            min_single_dose: 10.0,
            max_single_dose: 120.0,
            max_daily_dose: 120.0,
            frequency: "every_21_days".into(),
            route: "intravenous".into(),
            indications: strings(&["breast_cancer", "lymphoma", "leukemia"]),
            hepatic_metabolism: true,
            monitoring: strings(&["echocardiogram", "complete_blood_count"]),
            ..rule("doxorubicin", "anthracycline")
        },
        DosingRule {
            basis: DoseBasis::PerKg {
                low: 5.0,
                high: 7.0,
                per_day: true,
            },
            min_single_dose: 60.0,
            max_single_dose: 560.0,
            max_daily_dose: 560.0,
            frequency: "once_daily".into(),
            route: "intravenous".into(),
            indications: strings(&["gram_negative_infection", "sepsis"]),
            narrow_therapeutic_index: true,
            nephrotoxic: true,
            renal_clearance: true,
            monitoring: strings(&["serum_peak_and_trough", "renal_function"]),
            ..rule("gentamicin", "aminoglycoside_antibiotic")
        },
        DosingRule {
            standard_dose: Some(50.0),
            min_single_dose: 25.0,
            max_single_dose: 100.0,
            max_daily_dose: 100.0,
            indications: strings(&["hypertension", "angina"]),
            renal_clearance: true,
            ..rule("atenolol", "beta_blocker")
        },
        DosingRule {
            standard_dose: Some(80.0),
            min_single_dose: 10.0,
            max_single_dose: 160.0,
            max_daily_dose: 320.0,
            frequency: "twice_daily".into(),
            indications: strings(&["hypertension", "essential_tremor", "migraine_prophylaxis"]),
            hepatic_metabolism: true,
            ..rule("propranolol", "beta_blocker")
        },
        DosingRule {
            basis: DoseBasis::SlidingScale,
            min_single_dose: 1.0,
            max_single_dose: 20.0,
            max_daily_dose: 100.0,
            unit: "units".into(),
            frequency: "sliding_scale".into(),
            route: "subcutaneous".into(),
            indications: strings(&["diabetes_mellitus", "hyperglycemia"]),
            monitoring: strings(&["blood_glucose"]),
            ..rule("insulin", "antidiabetic_hormone")
        },
        DosingRule {
            basis: DoseBasis::Protocol,
            min_single_dose: 0.1,
            max_single_dose: 1.0,
            max_daily_dose: 10.0,
            route: "intravenous".into(),
            indications: strings(&["cardiac_arrest", "anaphylaxis"]),
            hepatic_metabolism: true,
            ..rule("epinephrine", "catecholamine")
        },
        DosingRule {
            basis: DoseBasis::Protocol,
            min_single_dose: 0.4,
            max_single_dose: 2.0,
            max_daily_dose: 10.0,
            route: "intravenous".into(),
            indications: strings(&["opioid_overdose"]),
            ..rule("naloxone", "opioid_antagonist")
        },
        DosingRule {
            standard_dose: Some(50.0),
            min_single_dose: 25.0,
            max_single_dose: 100.0,
            max_daily_dose: 300.0,
            unit: "mcg".into(),
            frequency: "every_hour_as_needed".into(),
            route: "intravenous".into(),
            indications: strings(&["severe_pain", "anesthesia_adjunct"]),
            hepatic_metabolism: true,
            monitoring: strings(&["respiratory_rate", "sedation_score"]),
            ..rule("fentanyl", "opioid")
        },
        DosingRule {
            standard_dose: Some(5.0),
            min_single_dose: 1.0,
            max_single_dose: 10.0,
            max_daily_dose: 10.0,
            toxic_dose: Some(15.0),
            indications: strings(&["atrial_fibrillation", "dvt_prophylaxis", "thromboembolism"]),
            narrow_therapeutic_index: true,
            hepatic_metabolism: true,
            monitoring: strings(&["inr"]),
            ..rule("warfarin", "anticoagulant")
        },
        DosingRule {
            standard_dose: Some(25.0),
            min_single_dose: 12.5,
            max_single_dose: 50.0,
            max_daily_dose: 300.0,
            frequency: "every_6_hours".into(),
            indications: strings(&["allergic_reaction", "insomnia"]),
            hepatic_metabolism: true,
            ..rule("diphenhydramine", "first_generation_antihistamine")
        },
    ];

    let alias = |generic: &str, brand: &str| MedicationAlias {
        generic_name: generic.into(),
        brand_name: brand.into(),
    };

    DosingTable {
        rules,
        aliases: vec![
            alias("warfarin", "Coumadin"),
            alias("acetaminophen", "Tylenol"),
            alias("ibuprofen", "Advil"),
            alias("ibuprofen", "Motrin"),
            alias("digoxin", "Lanoxin"),
            alias("sertraline", "Zoloft"),
            alias("phenelzine", "Nardil"),
            alias("diazepam", "Valium"),
            alias("amoxicillin", "Amoxil"),
            alias("epinephrine", "Adrenalin"),
            alias("naloxone", "Narcan"),
        ],
        families: vec![
            DrugFamily {
                family: "penicillin".into(),
                members: strings(&["penicillin", "amoxicillin", "ampicillin", "piperacillin"]),
            },
            DrugFamily {
                family: "nsaid".into(),
                members: strings(&["aspirin", "ibuprofen", "naproxen", "ketorolac", "diclofenac"]),
            },
            DrugFamily {
                family: "opioid".into(),
                members: strings(&[
                    "morphine",
                    "fentanyl",
                    "codeine",
                    "oxycodone",
                    "hydrocodone",
                    "hydromorphone",
                ]),
            },
            DrugFamily {
                family: "cephalosporin".into(),
                members: strings(&["cephalexin", "cefazolin", "ceftriaxone"]),
            },
            DrugFamily {
                family: "sulfonamide".into(),
                members: strings(&["sulfamethoxazole", "sulfasalazine", "sulfadiazine"]),
            },
            DrugFamily {
                family: "benzodiazepine".into(),
                members: strings(&["diazepam", "lorazepam", "midazolam", "alprazolam"]),
            },
            DrugFamily {
                family: "ssri".into(),
                members: strings(&["sertraline", "fluoxetine", "paroxetine", "escitalopram"]),
            },
            DrugFamily {
                family: "maoi".into(),
                members: strings(&["phenelzine", "tranylcypromine", "selegiline"]),
            },
        ],
        beers_list: vec![
            BeersEntry {
                generic_name: "diphenhydramine".into(),
                concern: "Anticholinergic medication inappropriate in elderly".into(),
            },
            BeersEntry {
                generic_name: "diazepam".into(),
                concern: "Benzodiazepine; increased fall and fracture risk in elderly".into(),
            },
            BeersEntry {
                generic_name: "amitriptyline".into(),
                concern: "Strongly anticholinergic; sedation and orthostatic hypotension".into(),
            },
        ],
        controlled_substances: vec![
            ControlledSubstance {
                generic_name: "fentanyl".into(),
                schedule: "II".into(),
            },
            ControlledSubstance {
                generic_name: "morphine".into(),
                schedule: "II".into(),
            },
            ControlledSubstance {
                generic_name: "oxycodone".into(),
                schedule: "II".into(),
            },
            ControlledSubstance {
                generic_name: "diazepam".into(),
                schedule: "IV".into(),
            },
            ControlledSubstance {
                generic_name: "tramadol".into(),
                schedule: "IV".into(),
            },
        ],
        emergency_protocols: vec![
            EmergencyDoseProtocol {
                generic_name: "epinephrine".into(),
                indication: "cardiac_arrest".into(),
                dose: 1.0,
                dose_max: None,
                unit: "mg".into(),
                route: "intravenous".into(),
                frequency: "every_3_minutes_prn".into(),
                max_doses: Some(10),
                instructions: Some("Push followed by 20mL saline flush".into()),
            },
            EmergencyDoseProtocol {
                generic_name: "epinephrine".into(),
                indication: "anaphylaxis".into(),
                dose: 0.3,
                dose_max: Some(0.5),
                unit: "mg".into(),
                route: "intramuscular".into(),
                frequency: "every_5_minutes_prn".into(),
                max_doses: Some(3),
                instructions: Some("Inject into mid-outer thigh; monitor airway".into()),
            },
            EmergencyDoseProtocol {
                generic_name: "naloxone".into(),
                indication: "opioid_overdose".into(),
                dose: 0.4,
                dose_max: Some(2.0),
                unit: "mg".into(),
                route: "intravenous".into(),
                frequency: "every_2_minutes_prn".into(),
                max_doses: Some(10),
                instructions: Some("Titrate to adequate spontaneous respiration".into()),
            },
        ],
        insulin: InsulinPolicy {
            basal_units_per_kg_day: 0.5,
            correction_cap_units: 15.0,
        },
    }
}

fn test_interaction_table() -> InteractionTable {
    let pair_rules = vec![
        InteractionRule {
            drug_a: "warfarin".into(),
            drug_b: "aspirin".into(),
            severity: FindingSeverity::High,
            label: "bleeding_risk".into(),
            mechanism: InteractionMechanism::PharmacodynamicSynergism {
                effect: "synergistic_anticoagulation".into(),
            },
            clinical_effects: strings(&["major_bleeding", "gi_hemorrhage"]),
            onset: Onset::Days,
            monitoring: strings(&["inr", "pt_ptt", "bleeding_signs"]),
            management: Some("Check INR within 3-5 days of starting the combination".into()),
            black_box: false,
            risk_factors: strings(&["elderly_patients", "peptic_ulcer_history"]),
        },
        InteractionRule {
            drug_a: "digoxin".into(),
            drug_b: "quinidine".into(),
            severity: FindingSeverity::High,
            label: "drug_level_increase".into(),
            mechanism: InteractionMechanism::PGlycoproteinInhibition,
            clinical_effects: strings(&["digoxin_toxicity", "arrhythmia", "nausea"]),
            onset: Onset::Days,
            monitoring: strings(&["serum_digoxin_level", "ecg"]),
            management: Some("Reduce digoxin dose by 50% and recheck level every 3 days".into()),
            black_box: false,
            risk_factors: strings(&["renal_impairment"]),
        },
        InteractionRule {
            drug_a: "warfarin".into(),
            drug_b: "fluconazole".into(),
            severity: FindingSeverity::High,
            label: "anticoagulant_potentiation".into(),
            mechanism: InteractionMechanism::EnzymeInhibition {
                enzyme: "CYP2C9".into(),
                magnitude: 2.5,
            },
            clinical_effects: strings(&["elevated_inr", "bleeding"]),
            onset: Onset::Days,
            monitoring: strings(&["inr"]),
            management: Some("Reduce warfarin dose 25-50% for the azole course".into()),
            black_box: false,
            risk_factors: Vec::new(),
        },
        InteractionRule {
            drug_a: "warfarin".into(),
            drug_b: "simvastatin".into(),
            severity: FindingSeverity::Moderate,
            label: "bleeding_risk_increase".into(),
            mechanism: InteractionMechanism::EnzymeInhibition {
                enzyme: "CYP3A4".into(),
                magnitude: 1.4,
            },
            clinical_effects: strings(&["modest_inr_rise"]),
            onset: Onset::Delayed,
            monitoring: strings(&["inr"]),
            management: Some("Monitor INR weekly for 2 weeks after statin start".into()),
            black_box: false,
            risk_factors: Vec::new(),
        },
        InteractionRule {
            drug_a: "aspirin".into(),
            drug_b: "ibuprofen".into(),
            severity: FindingSeverity::Minor,
            label: "antiplatelet_interference".into(),
            mechanism: InteractionMechanism::PharmacodynamicSynergism {
                effect: "competitive_cox_binding".into(),
            },
            clinical_effects: strings(&["reduced_cardioprotection"]),
            onset: Onset::Hours,
            monitoring: Vec::new(),
            management: Some("Dose aspirin at least 30 minutes before ibuprofen".into()),
            black_box: false,
            risk_factors: Vec::new(),
        },
    ];

    let class_rules = vec![
        ClassInteractionRule {
            class_a: "ssri".into(),
            class_b: "maoi".into(),
            severity: FindingSeverity::Fatal,
            label: "serotonin_syndrome".into(),
            mechanism: InteractionMechanism::SerotonergicPotentiation,
            clinical_effects: strings(&[
                "hyperthermia",
                "muscle_rigidity",
                "altered_mental_status",
                "autonomic_instability",
                "death",
            ]),
            onset: Onset::ImmediateToHours,
            monitoring: Vec::new(),
            management: Some("14_day_washout_required".into()),
            black_box: false,
            risk_factors: Vec::new(),
        },
        ClassInteractionRule {
            class_a: "opioid".into(),
            class_b: "benzodiazepine".into(),
            severity: FindingSeverity::Fatal,
            label: "respiratory_depression".into(),
            mechanism: InteractionMechanism::PharmacodynamicSynergism {
                effect: "synergistic_cns_depression".into(),
            },
            clinical_effects: strings(&[
                "profound_sedation",
                "respiratory_depression",
                "coma",
                "death",
            ]),
            onset: Onset::ImmediateToHours,
            monitoring: Vec::new(),
            management: Some(
                "Avoid co-prescription; if unavoidable use lowest doses and monitor respiration"
                    .into(),
            ),
            black_box: true,
            risk_factors: strings(&["elderly_patients", "respiratory_disease"]),
        },
        ClassInteractionRule {
            class_a: "ssri".into(),
            class_b: "nsaid".into(),
            severity: FindingSeverity::Moderate,
            label: "gi_bleeding_risk".into(),
            mechanism: InteractionMechanism::PharmacodynamicSynergism {
                effect: "impaired_platelet_aggregation".into(),
            },
            clinical_effects: strings(&["gi_bleeding"]),
            onset: Onset::Delayed,
            monitoring: strings(&["bleeding_signs"]),
            management: None,
            black_box: false,
            risk_factors: strings(&["peptic_ulcer_history"]),
        },
    ];

    let condition_rules = vec![
        ConditionContraindication {
            generic_name: "verapamil".into(),
            condition: "heart_failure".into(),
            reason: "Non-dihydropyridine calcium channel blockers worsen systolic heart failure"
                .into(),
        },
        ConditionContraindication {
            generic_name: "verapamil".into(),
            condition: "av_block".into(),
            reason: "Further AV nodal blockade can cause complete heart block".into(),
        },
        ConditionContraindication {
            generic_name: "ibuprofen".into(),
            condition: "active_gi_bleeding".into(),
            reason: "NSAIDs worsen gastrointestinal bleeding".into(),
        },
        ConditionContraindication {
            generic_name: "propranolol".into(),
            condition: "asthma".into(),
            reason: "Non-selective beta blockade provokes bronchospasm".into(),
        },
    ];

    InteractionTable::new(pair_rules, class_rules, condition_rules)
}

fn test_vital_reference() -> VitalReference {
    let band = |critical_low: f64, low: f64, high: f64, elevated_high: f64, critical_high: f64| {
        VitalBand {
            critical_low,
            low,
            high,
            elevated_high,
            critical_high,
        }
    };
    // SpO2 cannot exceed 100; the unreachable upper thresholds keep the
    // shared classification logic uniform.
    let spo2 = |critical_low: f64, low: f64| band(critical_low, low, 100.0, 100.5, 101.0);

    let bands = vec![
        VitalBandSet {
            label: "adult".into(),
            age_min_years: 16,
            age_max_years: 64,
            pregnancy: false,
            weight_max_kg: None,
            systolic: band(70.0, 90.0, 120.0, 139.0, 180.0),
            diastolic: band(40.0, 60.0, 80.0, 89.0, 120.0),
            heart_rate: band(40.0, 60.0, 100.0, 120.0, 150.0),
            respiratory_rate: band(8.0, 12.0, 20.0, 24.0, 30.0),
            temperature: band(32.0, 36.1, 37.0, 38.0, 40.0),
            oxygen_saturation: spo2(85.0, 95.0),
        },
        VitalBandSet {
            label: "geriatric".into(),
            age_min_years: 65,
            age_max_years: 130,
            pregnancy: false,
            weight_max_kg: None,
            systolic: band(75.0, 95.0, 140.0, 155.0, 180.0),
            diastolic: band(45.0, 60.0, 90.0, 95.0, 120.0),
            heart_rate: band(40.0, 55.0, 95.0, 115.0, 150.0),
            respiratory_rate: band(8.0, 12.0, 22.0, 26.0, 32.0),
            temperature: band(32.0, 35.8, 37.2, 38.0, 40.0),
            oxygen_saturation: spo2(82.0, 92.0),
        },
        VitalBandSet {
            label: "adolescent".into(),
            age_min_years: 13,
            age_max_years: 15,
            pregnancy: false,
            weight_max_kg: None,
            systolic: band(75.0, 90.0, 115.0, 130.0, 160.0),
            diastolic: band(40.0, 55.0, 78.0, 85.0, 110.0),
            heart_rate: band(40.0, 60.0, 105.0, 125.0, 155.0),
            respiratory_rate: band(8.0, 12.0, 20.0, 26.0, 34.0),
            temperature: band(32.0, 36.1, 37.0, 38.0, 40.0),
            oxygen_saturation: spo2(85.0, 95.0),
        },
        VitalBandSet {
            label: "school_age".into(),
            age_min_years: 6,
            age_max_years: 12,
            pregnancy: false,
            weight_max_kg: None,
            systolic: band(80.0, 90.0, 110.0, 125.0, 150.0),
            diastolic: band(40.0, 55.0, 75.0, 80.0, 100.0),
            heart_rate: band(45.0, 80.0, 120.0, 140.0, 160.0),
            respiratory_rate: band(8.0, 18.0, 24.0, 30.0, 40.0),
            temperature: band(32.0, 36.1, 37.2, 38.0, 40.0),
            oxygen_saturation: spo2(85.0, 95.0),
        },
        VitalBandSet {
            label: "young_child".into(),
            age_min_years: 1,
            age_max_years: 5,
            pregnancy: false,
            weight_max_kg: None,
            systolic: band(65.0, 80.0, 100.0, 110.0, 130.0),
            diastolic: band(35.0, 50.0, 70.0, 75.0, 95.0),
            heart_rate: band(60.0, 90.0, 140.0, 160.0, 180.0),
            respiratory_rate: band(12.0, 20.0, 30.0, 40.0, 50.0),
            temperature: band(32.0, 36.1, 37.2, 38.0, 40.0),
            oxygen_saturation: spo2(85.0, 95.0),
        },
        VitalBandSet {
            label: "neonate".into(),
            age_min_years: 0,
            age_max_years: 0,
            pregnancy: false,
            weight_max_kg: Some(4.5),
            systolic: band(45.0, 60.0, 80.0, 90.0, 100.0),
            diastolic: band(25.0, 35.0, 55.0, 65.0, 75.0),
            heart_rate: band(80.0, 120.0, 160.0, 180.0, 200.0),
            respiratory_rate: band(20.0, 30.0, 60.0, 70.0, 80.0),
            temperature: band(35.0, 36.5, 37.5, 38.0, 39.0),
            oxygen_saturation: spo2(80.0, 92.0),
        },
        VitalBandSet {
            label: "infant".into(),
            age_min_years: 0,
            age_max_years: 0,
            pregnancy: false,
            weight_max_kg: None,
            systolic: band(55.0, 70.0, 90.0, 100.0, 115.0),
            diastolic: band(30.0, 40.0, 60.0, 68.0, 85.0),
            heart_rate: band(70.0, 100.0, 150.0, 170.0, 190.0),
            respiratory_rate: band(15.0, 25.0, 45.0, 55.0, 65.0),
            temperature: band(34.0, 36.3, 37.5, 38.0, 39.5),
            oxygen_saturation: spo2(82.0, 93.0),
        },
        VitalBandSet {
            label: "pregnancy".into(),
            age_min_years: 14,
            age_max_years: 50,
            pregnancy: true,
            weight_max_kg: None,
            systolic: band(70.0, 85.0, 125.0, 139.0, 160.0),
            diastolic: band(40.0, 55.0, 85.0, 89.0, 110.0),
            heart_rate: band(45.0, 65.0, 110.0, 125.0, 150.0),
            respiratory_rate: band(8.0, 14.0, 22.0, 26.0, 32.0),
            temperature: band(32.0, 36.1, 37.0, 38.0, 40.0),
            oxygen_saturation: spo2(85.0, 95.0),
        },
    ];

    let emergencies = vec![
        EmergencyRule {
            condition: "hypertensive_crisis".into(),
            severity: ConditionSeverity::LifeThreatening,
            time_to_intervention: "immediate".into(),
            interventions: strings(&[
                "iv_antihypertensive_therapy",
                "continuous_bp_monitoring",
                "icu_admission",
            ]),
            complications: strings(&["stroke", "myocardial_infarction", "aortic_dissection"]),
            possible_causes: strings(&["medication_nonadherence", "renovascular_disease"]),
        },
        EmergencyRule {
            condition: "hypotensive_shock".into(),
            severity: ConditionSeverity::Critical,
            time_to_intervention: "immediate".into(),
            interventions: strings(&["iv_fluids", "vasopressors", "icu_monitoring"]),
            complications: strings(&["end_organ_failure", "cardiac_arrest"]),
            possible_causes: strings(&["hemorrhage", "sepsis", "cardiogenic_failure"]),
        },
        EmergencyRule {
            condition: "severe_hypoxemia".into(),
            severity: ConditionSeverity::Critical,
            time_to_intervention: "immediate".into(),
            interventions: strings(&["high_flow_oxygen", "intubation_consideration"]),
            complications: strings(&["respiratory_arrest", "hypoxic_brain_injury"]),
            possible_causes: strings(&["pneumonia", "pulmonary_embolism", "copd_exacerbation"]),
        },
        EmergencyRule {
            condition: "respiratory_depression".into(),
            severity: ConditionSeverity::Critical,
            time_to_intervention: "immediate".into(),
            interventions: strings(&["naloxone_if_opioid_induced", "ventilatory_support"]),
            complications: strings(&["respiratory_arrest"]),
            possible_causes: strings(&["opioid_overdose", "cns_depression"]),
        },
        EmergencyRule {
            condition: "severe_tachycardia".into(),
            severity: ConditionSeverity::High,
            time_to_intervention: "within_30_minutes".into(),
            interventions: strings(&["continuous_ecg_monitoring", "rate_control"]),
            complications: strings(&["hemodynamic_collapse", "myocardial_ischemia"]),
            possible_causes: strings(&["arrhythmia", "sepsis", "hyperthyroidism"]),
        },
        EmergencyRule {
            condition: "severe_bradycardia".into(),
            severity: ConditionSeverity::Critical,
            time_to_intervention: "immediate".into(),
            interventions: strings(&["atropine", "transcutaneous_pacing"]),
            complications: strings(&["asystole", "syncope"]),
            possible_causes: strings(&["heart_block", "medication_toxicity"]),
        },
        EmergencyRule {
            condition: "malignant_hyperthermia".into(),
            severity: ConditionSeverity::LifeThreatening,
            time_to_intervention: "immediate".into(),
            interventions: strings(&["active_cooling", "dantrolene"]),
            complications: strings(&["multi_organ_failure", "rhabdomyolysis"]),
            possible_causes: strings(&["anesthetic_reaction", "heat_stroke"]),
        },
        EmergencyRule {
            condition: "severe_hypothermia".into(),
            severity: ConditionSeverity::LifeThreatening,
            time_to_intervention: "immediate".into(),
            interventions: strings(&["active_rewarming", "warm_iv_fluids"]),
            complications: strings(&["cardiac_arrest", "ventricular_fibrillation"]),
            possible_causes: strings(&["environmental_exposure", "sepsis"]),
        },
        EmergencyRule {
            condition: "preeclampsia_risk".into(),
            severity: ConditionSeverity::High,
            time_to_intervention: "within_1_hour".into(),
            interventions: strings(&[
                "blood_pressure_control",
                "obstetric_consultation",
                "urine_protein_assessment",
            ]),
            complications: strings(&["eclampsia", "placental_abruption"]),
            possible_causes: strings(&["pregnancy_induced_hypertension"]),
        },
        EmergencyRule {
            condition: "preeclampsia".into(),
            severity: ConditionSeverity::Critical,
            time_to_intervention: "immediate".into(),
            interventions: strings(&[
                "magnesium_sulfate",
                "antihypertensive_therapy",
                "delivery_consideration",
            ]),
            complications: strings(&["eclampsia", "hellp_syndrome"]),
            possible_causes: strings(&["pregnancy_induced_hypertension"]),
        },
        EmergencyRule {
            condition: "pediatric_septic_shock".into(),
            severity: ConditionSeverity::LifeThreatening,
            time_to_intervention: "immediate".into(),
            interventions: strings(&[
                "iv_fluid_bolus",
                "broad_spectrum_antibiotics",
                "picu_admission",
            ]),
            complications: strings(&["multi_organ_failure", "death"]),
            possible_causes: strings(&["bacterial_sepsis"]),
        },
    ];

    VitalReference { bands, emergencies }
}

fn test_compliance_policy() -> CompliancePolicy {
    CompliancePolicy {
        approved_encryption_algorithms: strings(&["AES-256-GCM", "ChaCha20-Poly1305"]),
        min_key_bits: 256,
        max_key_rotation_days: 90,
        min_tls_version: "1.2".into(),
        require_forward_secrecy: true,
        audit_gap_threshold_minutes: 60,
        audit_retention_years: 6,
        audit_required_fields: strings(&["timestamp", "actor_id", "action", "resource", "outcome"]),
        session_timeout_minutes: 30,
        reidentification_threshold: 0.33,
        breach_media_threshold: 500,
        breach_individual_deadline_days: 60,
        breach_regulator_deadline_days: 60,
        compliance_score_threshold: 95,
        role_permissions: vec![
            RolePermission {
                role: "physician".into(),
                resource: "patient_record".into(),
                actions: strings(&["read", "write"]),
            },
            RolePermission {
                role: "physician".into(),
                resource: "prescription".into(),
                actions: strings(&["read", "write"]),
            },
            RolePermission {
                role: "nurse".into(),
                resource: "patient_record".into(),
                actions: strings(&["read"]),
            },
            RolePermission {
                role: "nurse".into(),
                resource: "vital_signs".into(),
                actions: strings(&["read", "write"]),
            },
            RolePermission {
                role: "pharmacist".into(),
                resource: "prescription".into(),
                actions: strings(&["read", "dispense"]),
            },
            RolePermission {
                role: "billing_clerk".into(),
                resource: "invoice".into(),
                actions: strings(&["read", "write"]),
            },
            RolePermission {
                role: "admin".into(),
                resource: "system_config".into(),
                actions: strings(&["read", "write"]),
            },
        ],
        rare_conditions: strings(&[
            "huntington_disease",
            "cystic_fibrosis",
            "hemophilia_a",
            "wilson_disease",
            "amyotrophic_lateral_sclerosis",
        ]),
        purpose_fields: vec![
            PurposeFields {
                purpose: "schedule_appointment".into(),
                allowed_fields: strings(&[
                    "name",
                    "phone",
                    "email",
                    "appointment_time",
                    "provider_id",
                ]),
            },
            PurposeFields {
                purpose: "billing".into(),
                allowed_fields: strings(&["name", "address", "insurance_id", "invoice_items"]),
            },
            PurposeFields {
                purpose: "treatment".into(),
                allowed_fields: strings(&[
                    "name",
                    "date_of_birth",
                    "medications",
                    "allergies",
                    "conditions",
                    "vital_signs",
                ]),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn load_reads_snapshot_directory() {
        let dir = tempfile::tempdir().unwrap();
        let reference = ReferenceData::load_test();

        fs::write(
            dir.path().join("snapshot.json"),
            serde_json::to_string(&SnapshotManifest {
                version: "2026.08".into(),
            })
            .unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("dosing.json"),
            serde_json::to_string(&reference.dosing).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("interactions.json"),
            serde_json::to_string(&reference.interactions).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("vital_bands.json"),
            serde_json::to_string(&reference.vitals).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("compliance.json"),
            serde_json::to_string(&reference.compliance).unwrap(),
        )
        .unwrap();

        let loaded = ReferenceData::load(dir.path()).unwrap();
        assert_eq!(loaded.version, "2026.08");
        assert_eq!(loaded.dosing.rules.len(), reference.dosing.rules.len());
        // The pair index must be rebuilt after deserialization.
        assert!(loaded.interactions.pair_rule("warfarin", "aspirin").is_some());
    }

    #[test]
    fn load_missing_directory_fails_with_path() {
        let err = ReferenceData::load(Path::new("/nonexistent/snapshot")).unwrap_err();
        match err {
            ReferenceError::Load { path, .. } => assert!(path.contains("snapshot.json")),
            other => panic!("expected Load error, got {other:?}"),
        }
    }

    #[test]
    fn load_rejects_malformed_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("snapshot.json"), "{\"version\": \"x\"}").unwrap();
        fs::write(dir.path().join("dosing.json"), "not json").unwrap();

        let err = ReferenceData::load(dir.path()).unwrap_err();
        match err {
            ReferenceError::Parse { file, .. } => assert_eq!(file, "dosing.json"),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_is_internally_consistent() {
        let reference = ReferenceData::load_test();
        // Every alias points at a known dosing rule or a profile-only drug.
        for alias in &reference.dosing.aliases {
            assert_eq!(alias.generic_name, alias.generic_name.to_lowercase());
        }
        // Every emergency the validator can derive has response knowledge.
        for condition in [
            "hypertensive_crisis",
            "hypotensive_shock",
            "severe_hypoxemia",
            "respiratory_depression",
            "severe_tachycardia",
            "severe_bradycardia",
            "malignant_hyperthermia",
            "severe_hypothermia",
            "preeclampsia_risk",
            "preeclampsia",
            "pediatric_septic_shock",
        ] {
            assert!(
                reference.vitals.emergency(condition).is_some(),
                "missing emergency rule: {condition}"
            );
        }
    }
}
