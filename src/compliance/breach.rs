use chrono::Duration;
use tracing::{debug, warn};

use crate::reference::ReferenceData;

use super::types::{BreachAssessment, BreachIncident};

/// Work out the notification obligations for a breach incident. Encrypted
/// data falls under safe harbor and needs documentation only; unsecured PHI
/// starts the notification clocks, with the media and immediate-regulator
/// tier added once the affected count crosses the policy threshold.
pub fn validate_breach_notification(
    incident: &BreachIncident,
    reference: &ReferenceData,
) -> BreachAssessment {
    let policy = &reference.compliance;

    if incident.data_encrypted {
        debug!(
            affected = incident.affected_records,
            "breach exempt under safe harbor"
        );
        return BreachAssessment {
            notification_required: false,
            risk: "encrypted_data_low_risk",
            individual_notification_deadline: None,
            regulator_notification_deadline: None,
            regulator_timing: None,
            media_notification_required: false,
            documentation_required: true,
        };
    }

    let large_incident = incident.affected_records >= policy.breach_media_threshold;
    let individual_deadline =
        incident.discovered_on + Duration::days(policy.breach_individual_deadline_days);

    warn!(
        affected = incident.affected_records,
        large_incident, "unsecured PHI breach requires notification"
    );

    BreachAssessment {
        notification_required: true,
        risk: "unsecured_phi",
        individual_notification_deadline: Some(individual_deadline),
        regulator_notification_deadline: large_incident.then(|| {
            incident.discovered_on + Duration::days(policy.breach_regulator_deadline_days)
        }),
        regulator_timing: Some(if large_incident {
            "within_60_days"
        } else {
            "annual_log"
        }),
        media_notification_required: large_incident,
        documentation_required: true,
    }
}
