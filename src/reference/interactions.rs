use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::FindingSeverity;

/// Pharmacological mechanism of a drug-drug interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionMechanism {
    /// Additive or synergistic effect at the target (e.g. CNS depressants).
    PharmacodynamicSynergism { effect: String },
    /// One drug inhibits the enzyme clearing the other; exposure rises by
    /// roughly `magnitude`.
    EnzymeInhibition { enzyme: String, magnitude: f64 },
    EnzymeInduction { enzyme: String },
    /// Displacement from plasma proteins raises free drug immediately.
    ProteinBindingDisplacement,
    PGlycoproteinInhibition,
    SerotonergicPotentiation,
}

impl InteractionMechanism {
    pub fn label(&self) -> &'static str {
        match self {
            InteractionMechanism::PharmacodynamicSynergism { .. } => "pharmacodynamic_synergism",
            InteractionMechanism::EnzymeInhibition { .. } => "enzyme_inhibition",
            InteractionMechanism::EnzymeInduction { .. } => "enzyme_induction",
            InteractionMechanism::ProteinBindingDisplacement => "protein_binding_displacement",
            InteractionMechanism::PGlycoproteinInhibition => "p_glycoprotein_inhibition",
            InteractionMechanism::SerotonergicPotentiation => "serotonergic_potentiation",
        }
    }

    /// Expected exposure multiplier for the affected drug, where the
    /// mechanism implies one.
    pub fn exposure_multiplier(&self) -> Option<f64> {
        match self {
            InteractionMechanism::EnzymeInhibition { magnitude, .. } => Some(*magnitude),
            InteractionMechanism::PGlycoproteinInhibition => Some(2.0),
            _ => None,
        }
    }
}

/// Time course from co-administration to clinical effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Onset {
    Immediate,
    ImmediateToHours,
    Hours,
    Days,
    Delayed,
}

impl Onset {
    pub fn as_str(self) -> &'static str {
        match self {
            Onset::Immediate => "immediate",
            Onset::ImmediateToHours => "immediate_to_hours",
            Onset::Hours => "hours",
            Onset::Days => "days",
            Onset::Delayed => "delayed",
        }
    }
}

/// A known interaction between two named drugs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub drug_a: String,
    pub drug_b: String,
    pub severity: FindingSeverity,
    /// Short label, e.g. "bleeding_risk", "drug_level_increase".
    pub label: String,
    pub mechanism: InteractionMechanism,
    pub clinical_effects: Vec<String>,
    pub onset: Onset,
    pub monitoring: Vec<String>,
    pub management: Option<String>,
    pub black_box: bool,
    pub risk_factors: Vec<String>,
}

/// A known interaction between two drug classes (matched on
/// `MedicationProfile::drug_class`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInteractionRule {
    pub class_a: String,
    pub class_b: String,
    pub severity: FindingSeverity,
    pub label: String,
    pub mechanism: InteractionMechanism,
    pub clinical_effects: Vec<String>,
    pub onset: Onset,
    pub monitoring: Vec<String>,
    pub management: Option<String>,
    pub black_box: bool,
    pub risk_factors: Vec<String>,
}

/// Absolute drug-condition contraindication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionContraindication {
    pub generic_name: String,
    pub condition: String,
    pub reason: String,
}

/// The interaction knowledge table of a reference snapshot. Pair rules are
/// indexed by drug name at load so that screening stays O(current
/// medications) per proposed drug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionTable {
    pub pair_rules: Vec<InteractionRule>,
    pub class_rules: Vec<ClassInteractionRule>,
    pub condition_rules: Vec<ConditionContraindication>,
    #[serde(skip)]
    index: HashMap<String, Vec<usize>>,
}

impl InteractionTable {
    pub fn new(
        pair_rules: Vec<InteractionRule>,
        class_rules: Vec<ClassInteractionRule>,
        condition_rules: Vec<ConditionContraindication>,
    ) -> Self {
        let mut table = Self {
            pair_rules,
            class_rules,
            condition_rules,
            index: HashMap::new(),
        };
        table.build_index();
        table
    }

    /// Rebuild the name index. Must be called after deserialization.
    pub fn build_index(&mut self) {
        self.index.clear();
        for (i, rule) in self.pair_rules.iter().enumerate() {
            self.index
                .entry(rule.drug_a.to_lowercase())
                .or_default()
                .push(i);
            self.index
                .entry(rule.drug_b.to_lowercase())
                .or_default()
                .push(i);
        }
    }

    /// Pair rule for two drugs, order-independent.
    pub fn pair_rule(&self, a: &str, b: &str) -> Option<&InteractionRule> {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        self.index.get(&a).and_then(|indices| {
            indices.iter().map(|&i| &self.pair_rules[i]).find(|r| {
                (r.drug_a.eq_ignore_ascii_case(&a) && r.drug_b.eq_ignore_ascii_case(&b))
                    || (r.drug_a.eq_ignore_ascii_case(&b) && r.drug_b.eq_ignore_ascii_case(&a))
            })
        })
    }

    /// Class rule for two drug classes, order-independent.
    pub fn class_rule(&self, class_a: &str, class_b: &str) -> Option<&ClassInteractionRule> {
        self.class_rules.iter().find(|r| {
            (r.class_a.eq_ignore_ascii_case(class_a) && r.class_b.eq_ignore_ascii_case(class_b))
                || (r.class_a.eq_ignore_ascii_case(class_b)
                    && r.class_b.eq_ignore_ascii_case(class_a))
        })
    }

    /// Condition contraindications for a drug.
    pub fn contraindications_for(&self, generic_name: &str) -> Vec<&ConditionContraindication> {
        let lower = generic_name.to_lowercase();
        self.condition_rules
            .iter()
            .filter(|c| c.generic_name == lower)
            .collect()
    }
}
