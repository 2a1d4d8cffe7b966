use tracing::info;
use uuid::Uuid;

use crate::models::RiskLevel;
use crate::reference::ReferenceData;

use super::audit_trail::validate_audit_trail;
use super::encryption::validate_data_encryption;
use super::phi::scan_for_phi;
use super::types::{CompliancePosture, ComplianceReport, ComplianceViolation, RemediationAction};

/// Severity-weighted score deductions.
const CRITICAL_DEDUCTION: u32 = 25;
const HIGH_DEDUCTION: u32 = 15;
const MEDIUM_DEDUCTION: u32 = 8;
const LOW_DEDUCTION: u32 = 3;

/// Remediation windows by severity, in days.
const CRITICAL_TIMELINE_DAYS: u32 = 7;
const HIGH_TIMELINE_DAYS: u32 = 30;
const MEDIUM_TIMELINE_DAYS: u32 = 60;
const LOW_TIMELINE_DAYS: u32 = 90;

/// Roll a whole compliance posture into one scored report: encryption
/// standard, audit trail health, identifier leakage in exported data, and
/// outstanding break-glass reviews. Every violation deducts from a score of
/// 100 by severity; the remediation plan orders the worst category first.
pub fn validate_hipaa_compliance(
    posture: &CompliancePosture,
    reference: &ReferenceData,
) -> ComplianceReport {
    let mut violations = Vec::new();

    match validate_data_encryption(&posture.encryption, reference) {
        Ok(assessment) => violations.extend(assessment.violations),
        Err(err) => violations.push(ComplianceViolation::new(
            "encryption",
            RiskLevel::Critical,
            err.to_string(),
        )),
    }

    violations.extend(validate_audit_trail(&posture.audit_trail, reference).violations);

    if let Some(sample) = &posture.exported_sample {
        match scan_for_phi(sample, reference) {
            Ok(scan) => {
                let categories = || {
                    scan.findings
                        .iter()
                        .map(|f| f.category.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                if scan.findings.iter().any(|f| f.risk == RiskLevel::Critical) {
                    violations.push(ComplianceViolation::new(
                        "phi_exposure",
                        RiskLevel::Critical,
                        format!("exported sample contains critical identifiers ({})", categories()),
                    ));
                } else if scan.contains_phi {
                    violations.push(ComplianceViolation::new(
                        "phi_exposure",
                        RiskLevel::High,
                        format!("exported sample contains identifiers ({})", categories()),
                    ));
                }
                if scan.additional_de_identification_required {
                    violations.push(ComplianceViolation::new(
                        "phi_exposure",
                        RiskLevel::Medium,
                        "exported sample carries a re-identifying quasi-identifier combination",
                    ));
                }
            }
            Err(err) => violations.push(ComplianceViolation::new(
                "phi_exposure",
                RiskLevel::High,
                format!("exported sample could not be scanned: {err}"),
            )),
        }
    }

    if posture.unreviewed_emergency_accesses > 0 {
        violations.push(ComplianceViolation::new(
            "access_control",
            RiskLevel::High,
            format!(
                "{} emergency accesses awaiting their mandatory review",
                posture.unreviewed_emergency_accesses
            ),
        ));
    }

    violations.sort_by(|a, b| b.severity.cmp(&a.severity));

    let deductions: u32 = violations.iter().map(|v| deduction(v.severity)).sum();
    let score = 100u32.saturating_sub(deductions);
    let compliant = score >= reference.compliance.compliance_score_threshold;
    let fines_risk = violations
        .iter()
        .map(|v| v.severity)
        .max()
        .unwrap_or(RiskLevel::Low);
    let remediation_plan = build_remediation_plan(&violations);

    info!(
        score,
        compliant,
        violations = violations.len(),
        "compliance posture assessed"
    );

    ComplianceReport {
        id: Uuid::new_v4(),
        score,
        compliant,
        violations,
        fines_risk,
        remediation_plan,
    }
}

/// One remediation action per violation category, ordered worst first. The
/// timeline comes from the category's most severe violation.
fn build_remediation_plan(violations: &[ComplianceViolation]) -> Vec<RemediationAction> {
    let mut plan: Vec<RemediationAction> = Vec::new();
    for violation in violations {
        if plan.iter().any(|a| a.category == violation.category) {
            continue;
        }
        plan.push(RemediationAction {
            priority: plan.len() as u8 + 1,
            category: violation.category.clone(),
            action: remediation_action(&violation.category),
            timeline_days: timeline_days(violation.severity),
        });
    }
    plan
}

fn deduction(severity: RiskLevel) -> u32 {
    match severity {
        RiskLevel::Critical => CRITICAL_DEDUCTION,
        RiskLevel::High => HIGH_DEDUCTION,
        RiskLevel::Medium => MEDIUM_DEDUCTION,
        RiskLevel::Low => LOW_DEDUCTION,
    }
}

fn timeline_days(severity: RiskLevel) -> u32 {
    match severity {
        RiskLevel::Critical => CRITICAL_TIMELINE_DAYS,
        RiskLevel::High => HIGH_TIMELINE_DAYS,
        RiskLevel::Medium => MEDIUM_TIMELINE_DAYS,
        RiskLevel::Low => LOW_TIMELINE_DAYS,
    }
}

fn remediation_action(category: &str) -> String {
    match category {
        "encryption" => "upgrade encryption to an approved algorithm and key length".to_string(),
        "key_management" => "rotate encryption keys and schedule regular rotation".to_string(),
        "transport_security" => {
            "enforce TLS at or above the policy minimum with forward secrecy".to_string()
        }
        "audit_completeness" => "capture all required fields on every audit entry".to_string(),
        "audit_continuity" => "investigate and close audit recording gaps".to_string(),
        "audit_integrity" => "restore the audit hash chain and investigate tampering".to_string(),
        "audit_retention" => "extend retention schedules to the policy minimum".to_string(),
        "phi_exposure" => "de-identify exported data before it leaves the system".to_string(),
        "access_control" => "complete the outstanding emergency access reviews".to_string(),
        other => format!("remediate {other} findings"),
    }
}
