use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::RiskLevel;

#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("Encryption algorithm {algorithm} does not meet HIPAA requirements: {reason}")]
    EncryptionStandard { algorithm: String, reason: String },
    #[error("Record cannot be scanned: {reason}")]
    Unscannable { reason: String },
}

/// A single regulatory violation. Non-compliance is reported as data; only
/// unscannable input and disallowed ciphers raise errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceViolation {
    pub category: String,
    pub severity: RiskLevel,
    pub description: String,
}

impl ComplianceViolation {
    pub(crate) fn new(
        category: impl Into<String>,
        severity: RiskLevel,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            severity,
            description: description.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// [1] PHI scanning
// ---------------------------------------------------------------------------

/// One identifier located in a record. The excerpt is redacted to its last
/// characters so the finding itself stays loggable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhiFinding {
    /// Identifier class: "ssn", "person_name", "date_of_birth", "phone",
    /// "email", "medical_record_number", "address".
    pub category: String,
    pub risk: RiskLevel,
    /// Dotted path to the value inside the scanned record.
    pub location: String,
    pub excerpt: String,
}

/// Individually harmless fields (ZIP, age, rare condition) found together.
/// Present only when at least two combine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuasiIdentifierRisk {
    pub fields: Vec<&'static str>,
    pub risk: RiskLevel,
    pub reidentification_probability: f64,
    pub recommendation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhiScanResult {
    pub contains_phi: bool,
    pub findings: Vec<PhiFinding>,
    pub quasi_identifiers: Option<QuasiIdentifierRisk>,
    /// Joint re-identification probability; 0.0 when fewer than two
    /// quasi-identifier classes are present.
    pub reidentification_probability: f64,
    pub additional_de_identification_required: bool,
    pub safe_for_logging: bool,
    /// Stricter than logging: any quasi-identifier combination disqualifies
    /// a record from analytics release, even below the policy threshold.
    pub safe_for_analytics: bool,
}

/// Fields present in a payload that the declared purpose does not need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimizationReport {
    pub purpose: String,
    pub unnecessary_fields: Vec<String>,
    pub minimal: bool,
    pub recommendation: Option<String>,
}

// ---------------------------------------------------------------------------
// [2] Encryption
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSecurity {
    pub tls_version: String,
    pub cipher_suite: String,
    pub forward_secrecy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    pub algorithm: String,
    pub key_bits: u32,
    pub last_key_rotation: Option<NaiveDate>,
    /// Reference date for rotation-age math; callers supply it so the
    /// assessment stays deterministic.
    pub assessed_on: NaiveDate,
    /// Transport posture, when data in transit is part of the assessment.
    pub transport: Option<TransportSecurity>,
}

/// At-rest and in-transit posture. The algorithm itself is vetted before
/// this is produced; remaining weaknesses are violations, not errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionAssessment {
    pub algorithm: String,
    pub compliant: bool,
    pub violations: Vec<ComplianceViolation>,
}

// ---------------------------------------------------------------------------
// [3] Access control
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRequest {
    pub actor_id: String,
    pub role: String,
    pub resource: String,
    pub action: String,
    /// Bulk export path: authorized action plus MFA and supervisor approval.
    pub bulk_export: bool,
    pub mfa_verified: bool,
    pub supervisor_approval: bool,
    /// Break-glass emergency access.
    pub emergency_access: bool,
    pub session_idle_minutes: Option<i64>,
}

impl AccessRequest {
    /// Plain single-record request with a fresh session.
    pub fn single(role: &str, resource: &str, action: &str) -> Self {
        Self {
            actor_id: "actor-1".into(),
            role: role.into(),
            resource: resource.into(),
            action: action.into(),
            bulk_export: false,
            mfa_verified: false,
            supervisor_approval: false,
            emergency_access: false,
            session_idle_minutes: Some(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessDecision {
    pub granted: bool,
    pub reason: &'static str,
    pub required_actions: Vec<&'static str>,
    pub requires_post_emergency_review: bool,
    pub audit_flags: Vec<&'static str>,
}

// ---------------------------------------------------------------------------
// [4] Audit trail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrailEntry {
    pub timestamp: NaiveDateTime,
    pub actor_id: String,
    pub action: String,
    pub resource: String,
    pub outcome: String,
    /// SHA-256 chain hash over the previous hash and this entry's fields.
    pub hash: Option<String>,
    /// Scheduled purge date, when one exists.
    pub retain_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditTrailAssessment {
    pub entries_reviewed: usize,
    pub complete: bool,
    pub continuous: bool,
    /// None when the trail carries no integrity hashes.
    pub hash_chain_verified: Option<bool>,
    pub retention_compliant: bool,
    pub violations: Vec<ComplianceViolation>,
}

// ---------------------------------------------------------------------------
// [5] Consent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub patient_id: String,
    pub allowed_uses: Vec<String>,
    pub granted_on: NaiveDate,
    pub expires_on: Option<NaiveDate>,
    pub revoked_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsentDecision {
    pub permitted: bool,
    /// "within_scope", "out_of_scope", "expired", "revoked",
    /// or "not_yet_effective".
    pub reason: &'static str,
    pub requires_new_consent: bool,
}

// ---------------------------------------------------------------------------
// [6] Breach notification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachIncident {
    pub discovered_on: NaiveDate,
    pub affected_records: u32,
    /// Whether the exposed data was encrypted at the time of exposure.
    pub data_encrypted: bool,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreachAssessment {
    pub notification_required: bool,
    /// "unsecured_phi" or "encrypted_data_low_risk".
    pub risk: &'static str,
    pub individual_notification_deadline: Option<NaiveDate>,
    pub regulator_notification_deadline: Option<NaiveDate>,
    /// "within_60_days" for large incidents, "annual_log" for small ones.
    pub regulator_timing: Option<&'static str>,
    pub media_notification_required: bool,
    /// Even exempt incidents must be documented.
    pub documentation_required: bool,
}

// ---------------------------------------------------------------------------
// [7] Aggregate posture
// ---------------------------------------------------------------------------

/// Everything the aggregate HIPAA review examines in one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompliancePosture {
    pub encryption: EncryptionConfig,
    pub audit_trail: Vec<AuditTrailEntry>,
    /// A payload representative of what leaves the system boundary.
    pub exported_sample: Option<serde_json::Value>,
    /// Break-glass accesses still awaiting their mandatory review.
    pub unreviewed_emergency_accesses: u32,
    pub assessed_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemediationAction {
    pub priority: u8,
    pub category: String,
    pub action: String,
    pub timeline_days: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub id: Uuid,
    /// 0-100 after weighted deductions.
    pub score: u32,
    pub compliant: bool,
    pub violations: Vec<ComplianceViolation>,
    pub fines_risk: RiskLevel,
    pub remediation_plan: Vec<RemediationAction>,
}
