use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{OverallStatus, VitalCategory, VitalSignsValidation};

/// Repeat alerts for an unchanged clinical picture are suppressed inside
/// this window. A newly crossed condition or an escalated level always
/// raises a fresh alert.
pub const SUPPRESSION_WINDOW_MINUTES: i64 = 15;
const CRITICAL_ACK_DEADLINE_MINUTES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalsAlert {
    pub id: Uuid,
    pub raised_at: NaiveDateTime,
    pub level: AlertLevel,
    /// Emergency condition names, or abnormal sign labels when no named
    /// emergency is present.
    pub conditions: Vec<String>,
    pub message: String,
    pub display_color: &'static str,
    pub sound_enabled: bool,
    pub escalation_chain: Vec<&'static str>,
    pub acknowledgment_deadline_minutes: Option<u32>,
}

/// Turn a validation verdict into a display alert, or suppress it when an
/// equivalent alert was already raised inside the suppression window.
pub fn generate_vital_signs_alert(
    validation: &VitalSignsValidation,
    recent: &[VitalsAlert],
    now: NaiveDateTime,
) -> Option<VitalsAlert> {
    if validation.overall_status == OverallStatus::Normal {
        return None;
    }

    let level = if validation.overall_status == OverallStatus::Critical {
        AlertLevel::Critical
    } else {
        AlertLevel::Warning
    };

    let mut conditions: Vec<String> = Vec::new();
    if validation.emergencies.is_empty() {
        for assessment in &validation.assessments {
            if assessment.category != VitalCategory::Normal
                && !conditions.iter().any(|c| c == assessment.label)
            {
                conditions.push(assessment.label.to_string());
            }
        }
    } else {
        conditions.extend(validation.emergencies.iter().map(|e| e.condition.clone()));
    }

    if suppressed(&conditions, level, recent, now) {
        debug!(
            level = level.as_str(),
            conditions = conditions.len(),
            "alert suppressed inside repeat window"
        );
        return None;
    }

    let alert = match level {
        AlertLevel::Critical => VitalsAlert {
            id: Uuid::new_v4(),
            raised_at: now,
            level,
            message: format!("CRITICAL VITAL SIGNS: {}", conditions.join(", ")),
            conditions,
            display_color: "red",
            sound_enabled: true,
            escalation_chain: vec!["nurse", "physician", "rapid_response_team"],
            acknowledgment_deadline_minutes: Some(CRITICAL_ACK_DEADLINE_MINUTES),
        },
        AlertLevel::Warning => VitalsAlert {
            id: Uuid::new_v4(),
            raised_at: now,
            level,
            message: format!("Abnormal vital signs: {}", conditions.join(", ")),
            conditions,
            display_color: "yellow",
            sound_enabled: false,
            escalation_chain: vec!["nurse"],
            acknowledgment_deadline_minutes: None,
        },
    };
    info!(
        level = alert.level.as_str(),
        conditions = alert.conditions.len(),
        "vital signs alert raised"
    );
    Some(alert)
}

/// An alert is a repeat when a recent one at the same or higher level
/// already covers every condition it would report.
fn suppressed(
    conditions: &[String],
    level: AlertLevel,
    recent: &[VitalsAlert],
    now: NaiveDateTime,
) -> bool {
    let window = Duration::minutes(SUPPRESSION_WINDOW_MINUTES);
    recent.iter().any(|alert| {
        let age = now.signed_duration_since(alert.raised_at);
        age >= Duration::zero()
            && age <= window
            && alert.level >= level
            && conditions.iter().all(|c| alert.conditions.contains(c))
    })
}
