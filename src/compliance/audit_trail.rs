use chrono::Months;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::models::RiskLevel;
use crate::reference::ReferenceData;

use super::types::{AuditTrailAssessment, AuditTrailEntry, ComplianceViolation};

/// Chain hash for one audit entry: SHA-256 over the previous hash and the
/// entry's identifying fields. The first entry of a trail chains from
/// `None`.
pub fn chain_hash(previous: Option<&str>, entry: &AuditTrailEntry) -> String {
    let mut hasher = Sha256::new();
    hasher.update(previous.unwrap_or(""));
    hasher.update("|");
    hasher.update(entry.timestamp.to_string());
    hasher.update("|");
    hasher.update(&entry.actor_id);
    hasher.update("|");
    hasher.update(&entry.action);
    hasher.update("|");
    hasher.update(&entry.resource);
    hasher.update("|");
    hasher.update(&entry.outcome);
    format!("{:x}", hasher.finalize())
}

/// Review an audit trail for completeness (required fields on every entry),
/// continuity (no unexplained recording gaps), integrity (hash chain), and
/// retention scheduling. Entries are expected in append order; continuity is
/// judged on timestamps regardless of that order.
pub fn validate_audit_trail(
    entries: &[AuditTrailEntry],
    reference: &ReferenceData,
) -> AuditTrailAssessment {
    let policy = &reference.compliance;
    let mut violations = Vec::new();

    // -----------------------------------------------------------------------
    // [1] Required fields
    // -----------------------------------------------------------------------
    let mut complete = true;
    for (index, entry) in entries.iter().enumerate() {
        for field in &policy.audit_required_fields {
            if missing_required_field(entry, field) {
                complete = false;
                violations.push(ComplianceViolation::new(
                    "audit_completeness",
                    RiskLevel::Medium,
                    format!("entry {index} is missing required field {field}"),
                ));
            }
        }
    }

    // -----------------------------------------------------------------------
    // [2] Recording continuity
    // -----------------------------------------------------------------------
    let mut ordered: Vec<&AuditTrailEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.timestamp);
    let mut continuous = true;
    for pair in ordered.windows(2) {
        let gap_minutes = (pair[1].timestamp - pair[0].timestamp).num_minutes();
        if gap_minutes > policy.audit_gap_threshold_minutes {
            continuous = false;
            violations.push(ComplianceViolation::new(
                "audit_continuity",
                RiskLevel::Medium,
                format!(
                    "{gap_minutes}-minute gap between {} and {}",
                    pair[0].timestamp, pair[1].timestamp
                ),
            ));
        }
    }

    // -----------------------------------------------------------------------
    // [3] Hash chain integrity
    // -----------------------------------------------------------------------
    let any_hashed = entries.iter().any(|e| e.hash.is_some());
    let hash_chain_verified = if !any_hashed {
        None
    } else {
        let mut verified = true;
        let mut previous: Option<&str> = None;
        for (index, entry) in entries.iter().enumerate() {
            match &entry.hash {
                Some(hash) if *hash == chain_hash(previous, entry) => {
                    previous = Some(hash.as_str());
                }
                Some(_) => {
                    verified = false;
                    violations.push(ComplianceViolation::new(
                        "audit_integrity",
                        RiskLevel::Critical,
                        format!("hash chain broken at entry {index}"),
                    ));
                    break;
                }
                None => {
                    verified = false;
                    violations.push(ComplianceViolation::new(
                        "audit_integrity",
                        RiskLevel::Critical,
                        format!("hash chain broken at entry {index} (missing hash)"),
                    ));
                    break;
                }
            }
        }
        Some(verified)
    };

    // -----------------------------------------------------------------------
    // [4] Retention scheduling
    // -----------------------------------------------------------------------
    let mut retention_compliant = true;
    for (index, entry) in entries.iter().enumerate() {
        let minimum = entry
            .timestamp
            .date()
            .checked_add_months(Months::new(policy.audit_retention_years * 12));
        if let (Some(retain_until), Some(minimum)) = (entry.retain_until, minimum) {
            if retain_until < minimum {
                retention_compliant = false;
                violations.push(ComplianceViolation::new(
                    "audit_retention",
                    RiskLevel::High,
                    format!(
                        "entry {index} scheduled for purge on {retain_until}, policy requires retention through {minimum}"
                    ),
                ));
            }
        }
    }

    if violations.is_empty() {
        debug!(entries = entries.len(), "audit trail verified");
    } else {
        warn!(
            entries = entries.len(),
            violations = violations.len(),
            "audit trail has defects"
        );
    }

    AuditTrailAssessment {
        entries_reviewed: entries.len(),
        complete,
        continuous,
        hash_chain_verified,
        retention_compliant,
        violations,
    }
}

fn missing_required_field(entry: &AuditTrailEntry, field: &str) -> bool {
    match field {
        "actor_id" => entry.actor_id.trim().is_empty(),
        "action" => entry.action.trim().is_empty(),
        "resource" => entry.resource.trim().is_empty(),
        "outcome" => entry.outcome.trim().is_empty(),
        // The timestamp is typed; it cannot be absent.
        _ => false,
    }
}
