use serde::{Deserialize, Serialize};

/// Role-based permission grant: which actions a role may perform on a
/// resource class. Anything not granted is denied (least privilege).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolePermission {
    pub role: String,
    pub resource: String,
    pub actions: Vec<String>,
}

/// Fields a declared purpose legitimately needs. Anything else present in
/// the payload is flagged by the minimization check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurposeFields {
    pub purpose: String,
    pub allowed_fields: Vec<String>,
}

/// Regulatory/compliance policy of a reference snapshot. All thresholds that
/// an auditor might tune live here rather than in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompliancePolicy {
    pub approved_encryption_algorithms: Vec<String>,
    pub min_key_bits: u32,
    pub max_key_rotation_days: i64,
    pub min_tls_version: String,
    pub require_forward_secrecy: bool,
    pub audit_gap_threshold_minutes: i64,
    pub audit_retention_years: u32,
    pub audit_required_fields: Vec<String>,
    pub session_timeout_minutes: i64,
    pub reidentification_threshold: f64,
    /// Incidents at or above this record count add the media/regulator
    /// immediate-notification tier.
    pub breach_media_threshold: u32,
    pub breach_individual_deadline_days: i64,
    pub breach_regulator_deadline_days: i64,
    pub compliance_score_threshold: u32,
    pub role_permissions: Vec<RolePermission>,
    /// Conditions rare enough to act as quasi-identifiers.
    pub rare_conditions: Vec<String>,
    pub purpose_fields: Vec<PurposeFields>,
}

impl CompliancePolicy {
    pub fn algorithm_approved(&self, algorithm: &str) -> bool {
        self.approved_encryption_algorithms
            .iter()
            .any(|a| a.eq_ignore_ascii_case(algorithm))
    }

    pub fn actions_for(&self, role: &str, resource: &str) -> Option<&[String]> {
        self.role_permissions
            .iter()
            .find(|p| p.role.eq_ignore_ascii_case(role) && p.resource.eq_ignore_ascii_case(resource))
            .map(|p| p.actions.as_slice())
    }

    pub fn is_rare_condition(&self, condition: &str) -> bool {
        self.rare_conditions
            .iter()
            .any(|c| c.eq_ignore_ascii_case(condition))
    }

    pub fn allowed_fields_for(&self, purpose: &str) -> Option<&[String]> {
        self.purpose_fields
            .iter()
            .find(|p| p.purpose.eq_ignore_ascii_case(purpose))
            .map(|p| p.allowed_fields.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use crate::reference::ReferenceData;

    #[test]
    fn approved_algorithms_are_case_insensitive() {
        let reference = ReferenceData::load_test();
        assert!(reference.compliance.algorithm_approved("AES-256-GCM"));
        assert!(reference.compliance.algorithm_approved("aes-256-gcm"));
        assert!(!reference.compliance.algorithm_approved("DES"));
    }

    #[test]
    fn role_matrix_lookup() {
        let reference = ReferenceData::load_test();
        let actions = reference
            .compliance
            .actions_for("physician", "patient_record")
            .unwrap();
        assert!(actions.contains(&"read".to_string()));
        assert!(reference
            .compliance
            .actions_for("janitor", "patient_record")
            .is_none());
    }

    #[test]
    fn purpose_allowlist_lookup() {
        let reference = ReferenceData::load_test();
        let fields = reference
            .compliance
            .allowed_fields_for("schedule_appointment")
            .unwrap();
        assert!(fields.contains(&"name".to_string()));
        assert!(!fields.contains(&"ssn".to_string()));
    }
}
