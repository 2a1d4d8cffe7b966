//! Regulatory compliance checks: PHI detection in arbitrary records,
//! encryption and transport standards, role-based access control, audit
//! trail integrity, consent scope, breach notification duties, and the
//! aggregate scored posture report.
//!
//! Every check is a pure function over the record under review and the
//! policy snapshot; non-compliance comes back as data. Only input too deep
//! to scan or a disallowed encryption algorithm is a typed error.

pub mod access;
pub mod audit_trail;
pub mod breach;
pub mod consent;
pub mod encryption;
pub mod hipaa;
pub mod phi;
pub mod types;

pub use access::check_access_controls;
pub use audit_trail::{chain_hash, validate_audit_trail};
pub use breach::validate_breach_notification;
pub use consent::check_consent_management;
pub use encryption::validate_data_encryption;
pub use hipaa::validate_hipaa_compliance;
pub use phi::{scan_for_phi, validate_data_minimization};
pub use types::{
    AccessDecision, AccessRequest, AuditTrailAssessment, AuditTrailEntry, BreachAssessment,
    BreachIncident, ComplianceError, CompliancePosture, ComplianceReport, ComplianceViolation,
    ConsentDecision, ConsentRecord, EncryptionAssessment, EncryptionConfig, MinimizationReport,
    PhiFinding, PhiScanResult, QuasiIdentifierRisk, RemediationAction, TransportSecurity,
};
