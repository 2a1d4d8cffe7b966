pub mod checker;
pub mod outcome;
pub mod types;
pub mod warnings;

pub use checker::{
    analyze_drug_combination, check_contraindications, check_drug_interactions,
    get_interaction_severity, validate_drug_combination,
};
pub use outcome::{predict_interaction_outcome, OutcomePrediction};
pub use types::{CombinationReport, InteractionError, InteractionFinding};
pub use warnings::{generate_interaction_warning, InteractionWarning, WarningLevel};
