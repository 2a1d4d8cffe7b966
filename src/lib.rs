//! Stateless clinical decision-support checks: dose verification, drug
//! interaction screening, vital-sign interpretation, and regulatory
//! compliance auditing.
//!
//! Every analyzer is a pure function over the caller's data plus a
//! [`reference::ReferenceData`] snapshot, and returns serializable results.
//! Clinical impossibilities and unusable reference data are typed errors;
//! clinically unsafe-but-real situations are findings in the result.

pub mod compliance; // PHI scanning, access control, audit, breach, HIPAA posture
pub mod dosage; // dose calculation and verification
pub mod interactions; // drug-drug, condition, allergy, duplicate screening
pub mod models; // shared domain types
pub mod reference; // clinical reference data snapshots
pub mod vitals; // vital-sign validation, emergencies, scores, trends, alerts

pub use reference::ReferenceData;
