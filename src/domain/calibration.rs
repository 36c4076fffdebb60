//! Sensor calibration domain service
//!
//! This module provides the unit conversions that turn raw analog values
//! from the smoke and soil probes into percentages.

use serde::{Deserialize, Serialize};

/// Round to one decimal place, half away from zero.
#[inline]
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Smoke sensor calibration
///
/// Converts a raw smoke value to percent of the calibration ceiling:
/// `percent = clamp(raw / ceiling * 100, 0, 100)`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmokeCalibration {
    /// Raw value that maps to 100%
    pub ceiling: f64,
}

impl SmokeCalibration {
    /// Raw ceiling of the field smoke probe
    pub const STANDARD: Self = Self { ceiling: 4.8 };

    pub const fn new(ceiling: f64) -> Self {
        Self { ceiling }
    }

    /// Convert a raw reading to a clamped percentage with one decimal.
    ///
    /// Non-finite input is read as zero.
    pub fn raw_to_percent(&self, raw: f64) -> f64 {
        let raw = if raw.is_finite() { raw } else { 0.0 };
        let percent = (raw / self.ceiling * 100.0).clamp(0.0, 100.0);
        round_to_tenth(percent)
    }
}

impl Default for SmokeCalibration {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Soil moisture calibration
///
/// Affine conversion `percent = raw * slope + offset`. The result is
/// deliberately left unclamped so an out-of-calibration probe shows up as
/// a negative or >100% value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoilCalibration {
    pub slope: f64,
    pub offset: f64,
}

impl SoilCalibration {
    /// Curve for the field soil probe
    pub const STANDARD: Self = Self {
        slope: -65.79,
        offset: 169.08,
    };

    pub const fn new(slope: f64, offset: f64) -> Self {
        Self { slope, offset }
    }

    /// Convert a raw reading to percent, rounded to one decimal
    pub fn raw_to_percent(&self, raw: f64) -> f64 {
        round_to_tenth(raw * self.slope + self.offset)
    }

    /// Create calibration from two known (raw, percent) points
    pub fn from_two_points(raw1: f64, percent1: f64, raw2: f64, percent2: f64) -> Self {
        let slope = (percent2 - percent1) / (raw2 - raw1);
        let offset = percent1 - slope * raw1;

        Self { slope, offset }
    }
}

impl Default for SoilCalibration {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Calibration set applied by feed adapters to every raw reading
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub smoke: SmokeCalibration,
    pub soil: SoilCalibration,
}

impl Calibration {
    pub const STANDARD: Self = Self {
        smoke: SmokeCalibration::STANDARD,
        soil: SoilCalibration::STANDARD,
    };

    pub const fn new(smoke: SmokeCalibration, soil: SoilCalibration) -> Self {
        Self { smoke, soil }
    }
}

/// Smoke raw value to percent using the standard ceiling of 4.8
pub fn convert_smoke_to_percent(raw: f64) -> f64 {
    SmokeCalibration::STANDARD.raw_to_percent(raw)
}

/// Soil raw value to percent using the standard affine curve
pub fn convert_soil_humidity_to_percent(raw: f64) -> f64 {
    SoilCalibration::STANDARD.raw_to_percent(raw)
}
