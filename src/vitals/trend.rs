use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{PatientDemographics, RiskLevel, VitalSigns};
use crate::reference::ReferenceData;

/// Minimum observations per parameter before a trend call is made.
const MIN_OBSERVATIONS: usize = 3;
/// Per-reading slope thresholds for the decompensation pattern.
const HEART_RATE_RISE_PER_READING: f64 = 5.0;
const SYSTOLIC_FALL_PER_READING: f64 = 5.0;
/// Shock index (heart rate / systolic) above this marks decompensation.
const SHOCK_INDEX_THRESHOLD: f64 = 0.9;
const FRAILTY_BUMP_THRESHOLD: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Insufficient,
    Improving,
    Stable,
    Deteriorating,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Insufficient => "insufficient",
            TrendDirection::Improving => "improving",
            TrendDirection::Stable => "stable",
            TrendDirection::Deteriorating => "deteriorating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeteriorationRisk {
    pub direction: TrendDirection,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub projected_window: Option<&'static str>,
    pub recommendation: Option<&'static str>,
    pub observations: usize,
}

/// Assess deterioration risk from a series of snapshots. Readings are
/// ordered by timestamp before fitting, so out-of-order input is fine.
/// Rising heart rate with falling systolic pressure is the decompensation
/// signature; the risk score is raised by a high shock index on the latest
/// reading, band-relative hypotension, and frailty.
pub fn predict_deterioration_risk(
    series: &[VitalSigns],
    demographics: &PatientDemographics,
    reference: &ReferenceData,
) -> DeteriorationRisk {
    let mut ordered: Vec<&VitalSigns> = series.iter().collect();
    ordered.sort_by_key(|v| v.recorded_at);

    let heart_rates = sampled(&ordered, |v| v.heart_rate);
    let systolics = sampled(&ordered, |v| v.systolic_bp);

    let (Some(heart_rate_slope), Some(systolic_slope)) =
        (slope(&heart_rates), slope(&systolics))
    else {
        return DeteriorationRisk {
            direction: TrendDirection::Insufficient,
            risk_score: 0.0,
            risk_level: RiskLevel::Low,
            projected_window: None,
            recommendation: None,
            observations: series.len(),
        };
    };

    let direction = if heart_rate_slope >= HEART_RATE_RISE_PER_READING
        && systolic_slope <= -SYSTOLIC_FALL_PER_READING
    {
        TrendDirection::Deteriorating
    } else if heart_rate_slope <= -HEART_RATE_RISE_PER_READING
        && systolic_slope >= SYSTOLIC_FALL_PER_READING
    {
        TrendDirection::Improving
    } else {
        TrendDirection::Stable
    };

    let mut risk_score: f64 = match direction {
        TrendDirection::Deteriorating => 0.6,
        TrendDirection::Stable => 0.15,
        TrendDirection::Improving | TrendDirection::Insufficient => 0.05,
    };

    if direction == TrendDirection::Deteriorating {
        if let Some(last) = ordered.last() {
            if let (Some(heart_rate), Some(systolic)) = (last.heart_rate, last.systolic_bp) {
                if systolic > 0.0 && heart_rate / systolic > SHOCK_INDEX_THRESHOLD {
                    risk_score += 0.2;
                }
            }
            if let (Some(systolic), Some(band)) =
                (last.systolic_bp, reference.vitals.select_band(demographics))
            {
                if systolic < band.systolic.low {
                    risk_score += 0.1;
                }
            }
        }
        if demographics
            .frailty_score
            .is_some_and(|f| f > FRAILTY_BUMP_THRESHOLD)
        {
            risk_score += 0.15;
        }
        risk_score = risk_score.min(0.95);
    }

    let risk_level = if risk_score >= 0.7 {
        RiskLevel::High
    } else if risk_score >= 0.4 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let (projected_window, recommendation) = match direction {
        TrendDirection::Deteriorating => (Some("2_to_4_hours"), Some("physician_evaluation")),
        _ => (None, None),
    };

    debug!(
        direction = direction.as_str(),
        heart_rate_slope,
        systolic_slope,
        risk = risk_score,
        "vital signs trend assessed"
    );

    DeteriorationRisk {
        direction,
        risk_score,
        risk_level,
        projected_window,
        recommendation,
        observations: series.len(),
    }
}

fn sampled(ordered: &[&VitalSigns], field: impl Fn(&VitalSigns) -> Option<f64>) -> Vec<(f64, f64)> {
    ordered
        .iter()
        .enumerate()
        .filter_map(|(index, reading)| field(reading).map(|value| (index as f64, value)))
        .collect()
}

/// Least-squares slope of value against observation index.
fn slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < MIN_OBSERVATIONS {
        return None;
    }
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|&(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|&(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|&(x, y)| x * y).sum();
    let sum_xx: f64 = points.iter().map(|&(x, _)| x * x).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return None;
    }
    Some((n * sum_xy - sum_x * sum_y) / denominator)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::models::Sex;
    use crate::reference::ReferenceData;

    use super::*;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 12)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn reading(hour: u32, heart_rate: f64, systolic: f64) -> VitalSigns {
        VitalSigns {
            recorded_at: at(hour),
            systolic_bp: Some(systolic),
            diastolic_bp: Some(60.0),
            heart_rate: Some(heart_rate),
            respiratory_rate: Some(16.0),
            temperature_c: Some(36.8),
            oxygen_saturation: Some(97.0),
            pain_score: None,
            consciousness: None,
        }
    }

    fn adult() -> PatientDemographics {
        PatientDemographics::adult(35, Sex::Male)
    }

    /// T-01: fewer than three readings cannot support a trend call.
    #[test]
    fn short_series_is_insufficient() {
        let reference = ReferenceData::load_test();
        let series = vec![reading(8, 72.0, 118.0), reading(9, 74.0, 116.0)];

        let risk = predict_deterioration_risk(&series, &adult(), &reference);
        assert_eq!(risk.direction, TrendDirection::Insufficient);
        assert_eq!(risk.observations, 2);
        assert!(risk.projected_window.is_none());
    }

    #[test]
    fn sparse_parameters_are_insufficient() {
        let reference = ReferenceData::load_test();
        let mut series = vec![
            reading(8, 80.0, 120.0),
            reading(9, 95.0, 105.0),
            reading(10, 110.0, 90.0),
            reading(11, 112.0, 88.0),
        ];
        series[0].heart_rate = None;
        series[2].heart_rate = None;

        let risk = predict_deterioration_risk(&series, &adult(), &reference);
        assert_eq!(risk.direction, TrendDirection::Insufficient);
    }

    /// T-02: rising heart rate with falling systolic pressure is the
    /// decompensation signature.
    #[test]
    fn rising_heart_rate_falling_pressure_deteriorates() {
        let reference = ReferenceData::load_test();
        let series = vec![
            reading(8, 80.0, 120.0),
            reading(9, 95.0, 105.0),
            reading(10, 110.0, 90.0),
        ];

        let risk = predict_deterioration_risk(&series, &adult(), &reference);
        assert_eq!(risk.direction, TrendDirection::Deteriorating);
        // Base 0.6 plus the shock-index bump (110/90 > 0.9).
        assert!((risk.risk_score - 0.8).abs() < 1e-9);
        assert_eq!(risk.risk_level, RiskLevel::High);
        assert_eq!(risk.projected_window, Some("2_to_4_hours"));
        assert_eq!(risk.recommendation, Some("physician_evaluation"));
    }

    /// T-03: readings carry timestamps, so arrival order does not matter.
    #[test]
    fn out_of_order_series_is_sorted_first() {
        let reference = ReferenceData::load_test();
        let series = vec![
            reading(10, 110.0, 90.0),
            reading(8, 80.0, 120.0),
            reading(9, 95.0, 105.0),
        ];

        let risk = predict_deterioration_risk(&series, &adult(), &reference);
        assert_eq!(risk.direction, TrendDirection::Deteriorating);
    }

    #[test]
    fn frailty_and_hypotension_raise_the_score() {
        let reference = ReferenceData::load_test();
        let mut demo = adult();
        demo.frailty_score = Some(4);
        let series = vec![
            reading(8, 80.0, 115.0),
            reading(9, 95.0, 100.0),
            reading(10, 110.0, 85.0),
        ];

        let risk = predict_deterioration_risk(&series, &demo, &reference);
        assert_eq!(risk.direction, TrendDirection::Deteriorating);
        // All bumps apply; the score is capped.
        assert!((risk.risk_score - 0.95).abs() < 1e-9);
        assert_eq!(risk.risk_level, RiskLevel::High);
    }

    #[test]
    fn gradual_deterioration_without_shock_is_medium() {
        let reference = ReferenceData::load_test();
        let series = vec![
            reading(8, 60.0, 130.0),
            reading(9, 70.0, 120.0),
            reading(10, 80.0, 110.0),
        ];

        let risk = predict_deterioration_risk(&series, &adult(), &reference);
        assert_eq!(risk.direction, TrendDirection::Deteriorating);
        assert!((risk.risk_score - 0.6).abs() < 1e-9);
        assert_eq!(risk.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn recovery_trend_is_improving() {
        let reference = ReferenceData::load_test();
        let series = vec![
            reading(8, 110.0, 90.0),
            reading(9, 95.0, 105.0),
            reading(10, 80.0, 120.0),
        ];

        let risk = predict_deterioration_risk(&series, &adult(), &reference);
        assert_eq!(risk.direction, TrendDirection::Improving);
        assert_eq!(risk.risk_level, RiskLevel::Low);
        assert!(risk.recommendation.is_none());
    }

    #[test]
    fn flat_series_is_stable() {
        let reference = ReferenceData::load_test();
        let series = vec![
            reading(8, 70.0, 118.0),
            reading(9, 72.0, 120.0),
            reading(10, 71.0, 119.0),
            reading(11, 70.0, 122.0),
        ];

        let risk = predict_deterioration_risk(&series, &adult(), &reference);
        assert_eq!(risk.direction, TrendDirection::Stable);
        assert_eq!(risk.risk_level, RiskLevel::Low);
        assert!(risk.projected_window.is_none());
    }
}
