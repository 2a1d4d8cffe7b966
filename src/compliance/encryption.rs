use tracing::{debug, warn};

use crate::models::RiskLevel;
use crate::reference::ReferenceData;

use super::types::{ComplianceError, ComplianceViolation, EncryptionAssessment, EncryptionConfig};

/// Assess an encryption configuration against the policy snapshot. A
/// disallowed algorithm is a hard error; weaknesses in an approved setup
/// (short keys, stale rotation, transport gaps) come back as violations.
pub fn validate_data_encryption(
    config: &EncryptionConfig,
    reference: &ReferenceData,
) -> Result<EncryptionAssessment, ComplianceError> {
    let policy = &reference.compliance;

    if !policy.algorithm_approved(&config.algorithm) {
        return Err(ComplianceError::EncryptionStandard {
            algorithm: config.algorithm.clone(),
            reason: format!(
                "not an approved algorithm (approved: {})",
                policy.approved_encryption_algorithms.join(", ")
            ),
        });
    }

    let mut violations = Vec::new();

    if config.key_bits < policy.min_key_bits {
        violations.push(ComplianceViolation::new(
            "encryption",
            RiskLevel::High,
            format!(
                "key length {} bits is below the {}-bit minimum",
                config.key_bits, policy.min_key_bits
            ),
        ));
    }

    match config.last_key_rotation {
        Some(rotated) => {
            let age_days = (config.assessed_on - rotated).num_days();
            if age_days > policy.max_key_rotation_days {
                violations.push(ComplianceViolation::new(
                    "key_management",
                    RiskLevel::Medium,
                    format!(
                        "encryption key last rotated {age_days} days ago (maximum {} days)",
                        policy.max_key_rotation_days
                    ),
                ));
            }
        }
        None => {
            violations.push(ComplianceViolation::new(
                "key_management",
                RiskLevel::Medium,
                "no key rotation on record",
            ));
        }
    }

    if let Some(transport) = &config.transport {
        match (
            tls_components(&transport.tls_version),
            tls_components(&policy.min_tls_version),
        ) {
            (Some(version), Some(minimum)) if version < minimum => {
                violations.push(ComplianceViolation::new(
                    "transport_security",
                    RiskLevel::High,
                    format!(
                        "TLS {} is below the required minimum {}",
                        transport.tls_version, policy.min_tls_version
                    ),
                ));
            }
            (None, _) => {
                violations.push(ComplianceViolation::new(
                    "transport_security",
                    RiskLevel::High,
                    format!("unrecognized TLS version {}", transport.tls_version),
                ));
            }
            _ => {}
        }

        if policy.require_forward_secrecy && !transport.forward_secrecy {
            violations.push(ComplianceViolation::new(
                "transport_security",
                RiskLevel::Medium,
                format!(
                    "cipher suite {} does not provide forward secrecy",
                    transport.cipher_suite
                ),
            ));
        }
    }

    let compliant = violations.is_empty();
    if compliant {
        debug!(algorithm = %config.algorithm, "encryption configuration compliant");
    } else {
        warn!(
            algorithm = %config.algorithm,
            violations = violations.len(),
            "encryption configuration has gaps"
        );
    }

    Ok(EncryptionAssessment {
        algorithm: config.algorithm.clone(),
        compliant,
        violations,
    })
}

fn tls_components(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.split_once('.')?;
    Some((major.trim().parse().ok()?, minor.trim().parse().ok()?))
}
