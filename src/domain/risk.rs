//! Fire-risk evaluation domain service
//!
//! Each of the five criteria is scored 0-3 points by walking a fixed
//! threshold ladder. The point total (0-15) becomes a percentage and a
//! four-step risk level.
//!
//! The ladders are not symmetric: some steps are strict (`<`, `>`) and some
//! inclusive (`<=`, `>=`). They are reproduced exactly as calibrated and
//! must not be "normalized".

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::SensorReading;

/// Highest score a single criterion can award
pub const MAX_CRITERION_POINTS: u8 = 3;

/// Highest total over all five criteria
pub const MAX_RISK_POINTS: u8 = MAX_CRITERION_POINTS * Criterion::COUNT as u8;

/// One comparison step of a ladder
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bound {
    /// value < x
    Lt(f64),
    /// value <= x
    Le(f64),
    /// value > x
    Gt(f64),
    /// value >= x
    Ge(f64),
}

impl Bound {
    #[inline]
    pub fn contains(self, value: f64) -> bool {
        match self {
            Bound::Lt(x) => value < x,
            Bound::Le(x) => value <= x,
            Bound::Gt(x) => value > x,
            Bound::Ge(x) => value >= x,
        }
    }
}

/// Ordered threshold steps; the first matching step wins, otherwise the
/// value scores the maximum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ladder {
    pub steps: [(Bound, u8); 3],
}

impl Ladder {
    pub const fn new(steps: [(Bound, u8); 3]) -> Self {
        Self { steps }
    }

    pub fn points(&self, value: f64) -> u8 {
        self.steps
            .iter()
            .find(|(bound, _)| bound.contains(value))
            .map(|&(_, points)| points)
            .unwrap_or(MAX_CRITERION_POINTS)
    }
}

/// The five scored criteria, in scoring order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Temperature,
    AirHumidity,
    SoilHumidity,
    Smoke,
    HeatIndex,
}

impl Criterion {
    pub const COUNT: usize = 5;

    pub const ALL: [Criterion; Criterion::COUNT] = [
        Criterion::Temperature,
        Criterion::AirHumidity,
        Criterion::SoilHumidity,
        Criterion::Smoke,
        Criterion::HeatIndex,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Criterion::Temperature => "temperature",
            Criterion::AirHumidity => "air humidity",
            Criterion::SoilHumidity => "soil humidity",
            Criterion::Smoke => "smoke",
            Criterion::HeatIndex => "heat index",
        }
    }

    /// Pick this criterion's input out of a reading
    pub fn value_of(&self, reading: &SensorReading) -> f64 {
        match self {
            Criterion::Temperature => reading.temperature,
            Criterion::AirHumidity => reading.air_humidity,
            Criterion::SoilHumidity => reading.soil_humidity,
            Criterion::Smoke => reading.smoke(),
            Criterion::HeatIndex => reading.heat_index,
        }
    }

    const fn index(&self) -> usize {
        match self {
            Criterion::Temperature => 0,
            Criterion::AirHumidity => 1,
            Criterion::SoilHumidity => 2,
            Criterion::Smoke => 3,
            Criterion::HeatIndex => 4,
        }
    }
}

/// Ordinal risk category
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Tag used by the display layer for styling
    pub const fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Map a risk percentage onto its level.
    ///
    /// `<=25` low, `26..=50` moderate, `51..=75` high, above critical.
    pub const fn from_percent(percent: u8) -> Self {
        match percent {
            0..=25 => RiskLevel::Low,
            26..=50 => RiskLevel::Moderate,
            51..=75 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    pub(crate) const fn index(&self) -> usize {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Moderate => 1,
            RiskLevel::High => 2,
            RiskLevel::Critical => 3,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a risk level tag is not recognized
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown risk level '{0}' (expected low, moderate, high or critical)")]
pub struct ParseRiskLevelError(pub String);

impl FromStr for RiskLevel {
    type Err = ParseRiskLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "moderate" | "mod" => Ok(RiskLevel::Moderate),
            "high" => Ok(RiskLevel::High),
            "critical" | "crit" => Ok(RiskLevel::Critical),
            _ => Err(ParseRiskLevelError(s.to_string())),
        }
    }
}

/// Points awarded per criterion, indexed in `Criterion::ALL` order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores(pub [u8; Criterion::COUNT]);

impl SubScores {
    pub fn get(&self, criterion: Criterion) -> u8 {
        self.0[criterion.index()]
    }

    pub fn total(&self) -> u8 {
        self.0.iter().sum()
    }
}

/// Outcome of scoring one reading.
///
/// Always produced whole by [`RiskModel::evaluate`]; level and percent are
/// never updated on their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub sub_scores: SubScores,
    /// Sum of the sub-scores (0-15)
    pub risk_points: u8,
    /// `round(risk_points / 15 * 100)` (0-100)
    pub risk_percent: u8,
    pub risk_level: RiskLevel,
}

impl RiskAssessment {
    fn from_sub_scores(sub_scores: SubScores) -> Self {
        let risk_points = sub_scores.total();
        let risk_percent = points_to_percent(risk_points);

        Self {
            sub_scores,
            risk_points,
            risk_percent,
            risk_level: RiskLevel::from_percent(risk_percent),
        }
    }
}

/// `round(points / 15 * 100)`, rounding halves up
pub fn points_to_percent(points: u8) -> u8 {
    let points = points.min(MAX_RISK_POINTS);
    (points as f64 / MAX_RISK_POINTS as f64 * 100.0).round() as u8
}

/// Threshold ladders for all five criteria
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskModel {
    pub temperature: Ladder,
    pub air_humidity: Ladder,
    pub soil_humidity: Ladder,
    pub smoke: Ladder,
    pub heat_index: Ladder,
}

impl RiskModel {
    /// Field-calibrated thresholds
    pub const STANDARD: Self = Self {
        temperature: Ladder::new([(Bound::Lt(28.0), 0), (Bound::Le(33.0), 1), (Bound::Le(38.0), 2)]),
        air_humidity: Ladder::new([(Bound::Gt(45.0), 0), (Bound::Ge(30.0), 1), (Bound::Ge(20.0), 2)]),
        soil_humidity: Ladder::new([(Bound::Gt(30.0), 0), (Bound::Ge(20.0), 1), (Bound::Ge(10.0), 2)]),
        smoke: Ladder::new([(Bound::Le(3.0), 0), (Bound::Le(6.0), 1), (Bound::Le(10.0), 2)]),
        heat_index: Ladder::new([(Bound::Lt(30.0), 0), (Bound::Le(36.0), 1), (Bound::Le(40.0), 2)]),
    };

    pub fn ladder(&self, criterion: Criterion) -> &Ladder {
        match criterion {
            Criterion::Temperature => &self.temperature,
            Criterion::AirHumidity => &self.air_humidity,
            Criterion::SoilHumidity => &self.soil_humidity,
            Criterion::Smoke => &self.smoke,
            Criterion::HeatIndex => &self.heat_index,
        }
    }

    /// Score a single criterion value
    pub fn score(&self, criterion: Criterion, value: f64) -> u8 {
        self.ladder(criterion).points(value)
    }

    /// Score a reading on all five criteria
    pub fn evaluate(&self, reading: &SensorReading) -> RiskAssessment {
        let mut scores = [0u8; Criterion::COUNT];
        for criterion in Criterion::ALL {
            scores[criterion.index()] = self.score(criterion, criterion.value_of(reading));
        }

        RiskAssessment::from_sub_scores(SubScores(scores))
    }
}

impl Default for RiskModel {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Evaluate a reading against the standard thresholds
pub fn evaluate_risk(reading: &SensorReading) -> RiskAssessment {
    RiskModel::STANDARD.evaluate(reading)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(criterion: Criterion, value: f64) -> u8 {
        RiskModel::STANDARD.score(criterion, value)
    }

    #[test]
    fn test_temperature_boundaries() {
        assert_eq!(score(Criterion::Temperature, 27.99), 0);
        assert_eq!(score(Criterion::Temperature, 28.0), 1);
        assert_eq!(score(Criterion::Temperature, 33.0), 1);
        assert_eq!(score(Criterion::Temperature, 33.01), 2);
        assert_eq!(score(Criterion::Temperature, 38.0), 2);
        assert_eq!(score(Criterion::Temperature, 38.01), 3);
    }

    #[test]
    fn test_air_humidity_boundaries() {
        assert_eq!(score(Criterion::AirHumidity, 45.01), 0);
        assert_eq!(score(Criterion::AirHumidity, 45.0), 1);
        assert_eq!(score(Criterion::AirHumidity, 30.0), 1);
        assert_eq!(score(Criterion::AirHumidity, 29.99), 2);
        assert_eq!(score(Criterion::AirHumidity, 20.0), 2);
        assert_eq!(score(Criterion::AirHumidity, 19.99), 3);
    }

    #[test]
    fn test_soil_humidity_boundaries() {
        assert_eq!(score(Criterion::SoilHumidity, 30.01), 0);
        assert_eq!(score(Criterion::SoilHumidity, 30.0), 1);
        assert_eq!(score(Criterion::SoilHumidity, 20.0), 1);
        assert_eq!(score(Criterion::SoilHumidity, 19.99), 2);
        assert_eq!(score(Criterion::SoilHumidity, 10.0), 2);
        assert_eq!(score(Criterion::SoilHumidity, 9.99), 3);
        assert_eq!(score(Criterion::SoilHumidity, -28.3), 3);
        assert_eq!(score(Criterion::SoilHumidity, 103.3), 0);
    }

    #[test]
    fn test_smoke_boundaries() {
        assert_eq!(score(Criterion::Smoke, 3.0), 0);
        assert_eq!(score(Criterion::Smoke, 3.01), 1);
        assert_eq!(score(Criterion::Smoke, 6.0), 1);
        assert_eq!(score(Criterion::Smoke, 6.01), 2);
        assert_eq!(score(Criterion::Smoke, 10.0), 2);
        assert_eq!(score(Criterion::Smoke, 10.01), 3);
    }

    #[test]
    fn test_heat_index_boundaries() {
        assert_eq!(score(Criterion::HeatIndex, 29.99), 0);
        assert_eq!(score(Criterion::HeatIndex, 30.0), 1);
        assert_eq!(score(Criterion::HeatIndex, 36.0), 1);
        assert_eq!(score(Criterion::HeatIndex, 36.01), 2);
        assert_eq!(score(Criterion::HeatIndex, 40.0), 2);
        assert_eq!(score(Criterion::HeatIndex, 40.01), 3);
    }

    #[test]
    fn test_critical_scenario() {
        let reading = SensorReading::new(38.0, 10.0, 5.0, 42.0, 12.9);
        let a = evaluate_risk(&reading);

        assert_eq!(a.sub_scores.get(Criterion::Temperature), 2);
        assert_eq!(a.sub_scores.get(Criterion::AirHumidity), 3);
        assert_eq!(a.sub_scores.get(Criterion::SoilHumidity), 3);
        assert_eq!(a.sub_scores.get(Criterion::HeatIndex), 3);
        assert_eq!(a.sub_scores.get(Criterion::Smoke), 3);
        assert_eq!(a.risk_points, 14);
        assert_eq!(a.risk_percent, 93);
        assert_eq!(a.risk_level, RiskLevel::Critical);
        assert_eq!(a.risk_level.as_str(), "critical");
    }

    #[test]
    fn test_calm_scenario() {
        let reading = SensorReading::new(24.0, 65.0, 40.0, 25.0, 2.5);
        let a = evaluate_risk(&reading);

        assert_eq!(a.sub_scores, SubScores([0; 5]));
        assert_eq!(a.risk_points, 0);
        assert_eq!(a.risk_percent, 0);
        assert_eq!(a.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_malformed_smoke_scores_as_zero() {
        let mut reading = SensorReading::new(24.0, 65.0, 40.0, 25.0, 0.0);
        reading.smoke_percent = f64::NAN;
        let a = evaluate_risk(&reading);
        assert_eq!(a.sub_scores.get(Criterion::Smoke), 0);
        assert_eq!(a.risk_points, 0);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let reading = SensorReading::new(31.0, 28.0, 15.0, 37.0, 4.0);
        assert_eq!(evaluate_risk(&reading), evaluate_risk(&reading));
    }

    #[test]
    fn test_achievable_percentages() {
        let expected = [0, 7, 13, 20, 27, 33, 40, 47, 53, 60, 67, 73, 80, 87, 93, 100];
        let actual: Vec<u8> = (0..=MAX_RISK_POINTS).map(points_to_percent).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_level_mapping_is_exhaustive() {
        for percent in 0..=100u8 {
            let level = RiskLevel::from_percent(percent);
            let expected = if percent <= 25 {
                RiskLevel::Low
            } else if percent <= 50 {
                RiskLevel::Moderate
            } else if percent <= 75 {
                RiskLevel::High
            } else {
                RiskLevel::Critical
            };
            assert_eq!(level, expected, "percent {percent}");
        }
        assert_eq!(RiskLevel::from_percent(26), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_percent(51), RiskLevel::High);
        assert_eq!(RiskLevel::from_percent(76), RiskLevel::Critical);
    }

    #[test]
    fn test_points_stay_in_range() {
        let extremes = [-50.0, 0.0, 10.0, 20.0, 30.0, 45.0, 100.0, 1e6];
        for &t in &extremes {
            for &h in &extremes {
                let a = evaluate_risk(&SensorReading::new(t, h, h, t, t));
                assert!(a.risk_points <= MAX_RISK_POINTS);
                assert_eq!(a.risk_percent, points_to_percent(a.risk_points));
                assert_eq!(a.risk_level, RiskLevel::from_percent(a.risk_percent));
            }
        }
    }

    #[test]
    fn test_level_parses_from_tag() {
        for level in RiskLevel::ALL {
            assert_eq!(level.as_str().parse::<RiskLevel>(), Ok(level));
        }
        assert_eq!("CRITICAL".parse::<RiskLevel>(), Ok(RiskLevel::Critical));
        assert!("extreme".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_level_serializes_as_tag() {
        let json = serde_json::to_string(&RiskLevel::Moderate).unwrap();
        assert_eq!(json, "\"moderate\"");
    }
}
