use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{ConsciousnessLevel, VitalSigns};

/// Aggregate early-warning risk tier. `LowMedium` is the urgent-review tier
/// forced by a single parameter scoring 3 even when the total stays low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRisk {
    Low,
    LowMedium,
    Medium,
    High,
}

impl ScoreRisk {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreRisk::Low => "low",
            ScoreRisk::LowMedium => "low_medium",
            ScoreRisk::Medium => "medium",
            ScoreRisk::High => "high",
        }
    }
}

/// Early-warning scores for one snapshot: NEWS aggregate with monitoring
/// guidance, plus qSOFA for sepsis screening. Missing parameters score 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalSignsScore {
    pub news_total: u8,
    pub news_risk: ScoreRisk,
    pub monitoring_frequency: &'static str,
    /// Any single parameter at 3 points, which forces an urgent review even
    /// at a low aggregate.
    pub single_parameter_alert: bool,
    pub qsofa_total: u8,
    pub high_sepsis_risk: bool,
    pub recommendations: Vec<&'static str>,
}

pub fn calculate_vital_signs_score(vitals: &VitalSigns) -> VitalSignsScore {
    // -----------------------------------------------------------------------
    // [1] NEWS component points
    // -----------------------------------------------------------------------
    let components = [
        vitals.respiratory_rate.map_or(0, respiratory_rate_points),
        vitals.oxygen_saturation.map_or(0, oxygen_saturation_points),
        vitals.temperature_c.map_or(0, temperature_points),
        vitals.systolic_bp.map_or(0, systolic_points),
        vitals.heart_rate.map_or(0, heart_rate_points),
        consciousness_points(vitals.consciousness),
    ];
    let news_total: u8 = components.iter().sum();
    let single_parameter_alert = components.contains(&3);

    let news_risk = match news_total {
        0..=4 if single_parameter_alert => ScoreRisk::LowMedium,
        0..=4 => ScoreRisk::Low,
        5..=6 => ScoreRisk::Medium,
        _ => ScoreRisk::High,
    };
    let monitoring_frequency = match news_risk {
        ScoreRisk::Low => "every_12_hours",
        ScoreRisk::LowMedium => "every_4_to_6_hours",
        ScoreRisk::Medium => "every_hour",
        ScoreRisk::High => "continuous",
    };

    // -----------------------------------------------------------------------
    // [2] qSOFA sepsis screen
    // -----------------------------------------------------------------------
    let mut qsofa_total = 0u8;
    if vitals.systolic_bp.is_some_and(|s| s <= 100.0) {
        qsofa_total += 1;
    }
    if vitals.respiratory_rate.is_some_and(|r| r >= 22.0) {
        qsofa_total += 1;
    }
    if vitals
        .consciousness
        .is_some_and(|c| c != ConsciousnessLevel::Alert)
    {
        qsofa_total += 1;
    }
    let high_sepsis_risk = qsofa_total >= 2;

    // -----------------------------------------------------------------------
    // [3] Recommendations
    // -----------------------------------------------------------------------
    let mut recommendations: Vec<&'static str> = match news_risk {
        ScoreRisk::High => vec!["urgent_clinical_review", "continuous_monitoring"],
        ScoreRisk::Medium => vec!["urgent_clinical_review"],
        ScoreRisk::LowMedium => vec!["urgent_parameter_review"],
        ScoreRisk::Low => Vec::new(),
    };
    if high_sepsis_risk {
        recommendations.push("sepsis_protocol");
    }

    debug!(
        news = news_total,
        qsofa = qsofa_total,
        risk = news_risk.as_str(),
        "vital signs scored"
    );

    VitalSignsScore {
        news_total,
        news_risk,
        monitoring_frequency,
        single_parameter_alert,
        qsofa_total,
        high_sepsis_risk,
        recommendations,
    }
}

// ---------------------------------------------------------------------------
// [4] NEWS breakpoints
// ---------------------------------------------------------------------------

fn respiratory_rate_points(rate: f64) -> u8 {
    if rate <= 8.0 {
        3
    } else if rate < 12.0 {
        1
    } else if rate <= 20.0 {
        0
    } else if rate <= 24.0 {
        2
    } else {
        3
    }
}

fn oxygen_saturation_points(spo2: f64) -> u8 {
    if spo2 <= 91.0 {
        3
    } else if spo2 <= 93.0 {
        2
    } else if spo2 <= 95.0 {
        1
    } else {
        0
    }
}

fn temperature_points(temperature: f64) -> u8 {
    if temperature <= 35.0 {
        3
    } else if temperature <= 36.0 {
        1
    } else if temperature <= 38.0 {
        0
    } else if temperature <= 39.0 {
        1
    } else {
        2
    }
}

fn systolic_points(systolic: f64) -> u8 {
    if systolic <= 90.0 {
        3
    } else if systolic <= 100.0 {
        2
    } else if systolic <= 110.0 {
        1
    } else if systolic < 220.0 {
        0
    } else {
        3
    }
}

fn heart_rate_points(rate: f64) -> u8 {
    if rate <= 40.0 {
        3
    } else if rate <= 50.0 {
        1
    } else if rate <= 90.0 {
        0
    } else if rate <= 110.0 {
        1
    } else if rate <= 130.0 {
        2
    } else {
        3
    }
}

fn consciousness_points(level: Option<ConsciousnessLevel>) -> u8 {
    match level {
        Some(ConsciousnessLevel::Alert) | None => 0,
        Some(_) => 3,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;

    fn at_noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 12)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn snapshot(
        systolic: f64,
        heart_rate: f64,
        respiratory_rate: f64,
        temperature: f64,
        spo2: f64,
        consciousness: ConsciousnessLevel,
    ) -> VitalSigns {
        VitalSigns {
            recorded_at: at_noon(),
            systolic_bp: Some(systolic),
            diastolic_bp: Some(76.0),
            heart_rate: Some(heart_rate),
            respiratory_rate: Some(respiratory_rate),
            temperature_c: Some(temperature),
            oxygen_saturation: Some(spo2),
            pain_score: None,
            consciousness: Some(consciousness),
        }
    }

    /// T-01: textbook vitals score zero with routine monitoring.
    #[test]
    fn normal_snapshot_scores_zero() {
        let vitals = snapshot(118.0, 72.0, 14.0, 36.8, 98.0, ConsciousnessLevel::Alert);
        let score = calculate_vital_signs_score(&vitals);
        assert_eq!(score.news_total, 0);
        assert_eq!(score.news_risk, ScoreRisk::Low);
        assert_eq!(score.monitoring_frequency, "every_12_hours");
        assert!(!score.single_parameter_alert);
        assert_eq!(score.qsofa_total, 0);
        assert!(score.recommendations.is_empty());
    }

    /// T-02: RR 22 + SpO2 93 + systolic 100 aggregates to NEWS 6 (medium,
    /// hourly monitoring) and trips qSOFA on two criteria.
    #[test]
    fn medium_tier_with_sepsis_screen() {
        let vitals = snapshot(100.0, 80.0, 22.0, 37.0, 93.0, ConsciousnessLevel::Alert);
        let score = calculate_vital_signs_score(&vitals);
        assert_eq!(score.news_total, 6);
        assert_eq!(score.news_risk, ScoreRisk::Medium);
        assert_eq!(score.monitoring_frequency, "every_hour");
        assert!(!score.single_parameter_alert);

        assert_eq!(score.qsofa_total, 2);
        assert!(score.high_sepsis_risk);
        assert!(score.recommendations.contains(&"urgent_clinical_review"));
        assert!(score.recommendations.contains(&"sepsis_protocol"));
    }

    /// T-03: one parameter at 3 points forces the urgent-review tier even
    /// with a low aggregate.
    #[test]
    fn single_extreme_parameter_forces_review() {
        let vitals = snapshot(118.0, 72.0, 8.0, 36.8, 98.0, ConsciousnessLevel::Alert);
        let score = calculate_vital_signs_score(&vitals);
        assert_eq!(score.news_total, 3);
        assert!(score.single_parameter_alert);
        assert_eq!(score.news_risk, ScoreRisk::LowMedium);
        assert_eq!(score.monitoring_frequency, "every_4_to_6_hours");
        assert!(score.recommendations.contains(&"urgent_parameter_review"));
    }

    #[test]
    fn high_tier_requires_continuous_monitoring() {
        let vitals = snapshot(85.0, 135.0, 25.0, 34.5, 91.0, ConsciousnessLevel::Pain);
        let score = calculate_vital_signs_score(&vitals);
        assert_eq!(score.news_total, 18);
        assert_eq!(score.news_risk, ScoreRisk::High);
        assert_eq!(score.monitoring_frequency, "continuous");
        assert!(score.recommendations.contains(&"continuous_monitoring"));
        assert_eq!(score.qsofa_total, 3);
        assert!(score.recommendations.contains(&"sepsis_protocol"));
    }

    #[test]
    fn missing_parameters_score_zero() {
        let vitals = VitalSigns {
            recorded_at: at_noon(),
            systolic_bp: None,
            diastolic_bp: None,
            heart_rate: Some(72.0),
            respiratory_rate: None,
            temperature_c: None,
            oxygen_saturation: None,
            pain_score: None,
            consciousness: None,
        };
        let score = calculate_vital_signs_score(&vitals);
        assert_eq!(score.news_total, 0);
        assert_eq!(score.news_risk, ScoreRisk::Low);
        assert_eq!(score.qsofa_total, 0);
    }

    #[test]
    fn altered_consciousness_alone_forces_review() {
        let vitals = snapshot(118.0, 72.0, 14.0, 36.8, 98.0, ConsciousnessLevel::Unresponsive);
        let score = calculate_vital_signs_score(&vitals);
        assert_eq!(score.news_total, 3);
        assert_eq!(score.news_risk, ScoreRisk::LowMedium);
        assert!(score.single_parameter_alert);
        assert_eq!(score.qsofa_total, 1);
        assert!(!score.high_sepsis_risk);
    }
}
