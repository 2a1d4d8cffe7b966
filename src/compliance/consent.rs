use chrono::NaiveDate;
use tracing::{debug, warn};

use super::types::{ConsentDecision, ConsentRecord};

/// Decide whether a proposed use of patient data is covered by a consent
/// record as of a given date. Revocation wins over every other state; an
/// expired or out-of-scope consent needs a fresh grant, one that is not yet
/// effective only needs time.
pub fn check_consent_management(
    consent: &ConsentRecord,
    proposed_use: &str,
    as_of: NaiveDate,
) -> ConsentDecision {
    if consent.revoked_on.is_some_and(|revoked| revoked <= as_of) {
        debug!(patient = %consent.patient_id, "consent revoked");
        return ConsentDecision {
            permitted: false,
            reason: "revoked",
            requires_new_consent: true,
        };
    }

    if consent.expires_on.is_some_and(|expires| as_of > expires) {
        debug!(patient = %consent.patient_id, "consent expired");
        return ConsentDecision {
            permitted: false,
            reason: "expired",
            requires_new_consent: true,
        };
    }

    if consent.granted_on > as_of {
        return ConsentDecision {
            permitted: false,
            reason: "not_yet_effective",
            requires_new_consent: false,
        };
    }

    let within_scope = consent
        .allowed_uses
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(proposed_use));
    if !within_scope {
        warn!(
            patient = %consent.patient_id,
            proposed_use,
            "data use attempted outside consent scope"
        );
        return ConsentDecision {
            permitted: false,
            reason: "out_of_scope",
            requires_new_consent: true,
        };
    }

    ConsentDecision {
        permitted: true,
        reason: "within_scope",
        requires_new_consent: false,
    }
}
