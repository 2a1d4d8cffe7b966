use tracing::{debug, warn};

use crate::reference::ReferenceData;

use super::types::{AccessDecision, AccessRequest};

/// Decide an access request against the role-permission matrix. Evaluation
/// order: break-glass override, session freshness, role permissions, then
/// bulk-export safeguards. Every denial names the follow-up the actor must
/// take.
pub fn check_access_controls(request: &AccessRequest, reference: &ReferenceData) -> AccessDecision {
    let policy = &reference.compliance;

    // Break-glass wins over everything else, but never silently: the
    // override is flagged for mandatory review.
    if request.emergency_access {
        warn!(
            actor = %request.actor_id,
            resource = %request.resource,
            "emergency access override granted"
        );
        let mut decision = grant("emergency_override");
        decision.requires_post_emergency_review = true;
        decision.required_actions = vec!["supervisor_notification", "post_emergency_review"];
        decision.audit_flags = vec!["emergency_access"];
        return decision;
    }

    if let Some(idle) = request.session_idle_minutes {
        if idle > policy.session_timeout_minutes {
            debug!(actor = %request.actor_id, idle, "session expired");
            let mut decision = deny("session_expired");
            decision.required_actions = vec!["re_authentication"];
            return decision;
        }
    }

    let permitted = policy
        .actions_for(&request.role, &request.resource)
        .is_some_and(|actions| {
            actions
                .iter()
                .any(|a| a.eq_ignore_ascii_case(&request.action))
        });
    if !permitted {
        warn!(
            actor = %request.actor_id,
            role = %request.role,
            resource = %request.resource,
            action = %request.action,
            "access denied by role matrix"
        );
        let mut decision = deny("insufficient_permissions");
        decision.audit_flags = vec!["alert_security_team"];
        return decision;
    }

    if request.bulk_export {
        let mut missing = Vec::new();
        if !request.mfa_verified {
            missing.push("mfa_verification");
        }
        if !request.supervisor_approval {
            missing.push("supervisor_approval");
        }
        if !missing.is_empty() {
            let mut decision = deny("bulk_export_requirements_unmet");
            decision.required_actions = missing;
            decision.audit_flags = vec!["bulk_export"];
            return decision;
        }
        let mut decision = grant("authorized");
        decision.audit_flags = vec!["bulk_export"];
        return decision;
    }

    debug!(
        actor = %request.actor_id,
        role = %request.role,
        resource = %request.resource,
        "access granted"
    );
    grant("authorized")
}

fn grant(reason: &'static str) -> AccessDecision {
    AccessDecision {
        granted: true,
        reason,
        required_actions: Vec::new(),
        requires_post_emergency_review: false,
        audit_flags: Vec::new(),
    }
}

fn deny(reason: &'static str) -> AccessDecision {
    AccessDecision {
        granted: false,
        reason,
        required_actions: Vec::new(),
        requires_post_emergency_review: false,
        audit_flags: Vec::new(),
    }
}
