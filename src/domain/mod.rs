//! Domain layer - pure fire-risk logic independent of infrastructure
//!
//! This module contains the sensor entities, the unit conversions and
//! the risk scoring. Nothing here performs I/O or logs.

pub mod aggregate;
pub mod calibration;
pub mod reading;
pub mod risk;

pub use aggregate::{assess_devices, summarize, DeviceAssessment, FleetSummary};
pub use calibration::{
    convert_smoke_to_percent, convert_soil_humidity_to_percent, Calibration, SmokeCalibration,
    SoilCalibration,
};
pub use reading::{parse_smoke, sanitize_smoke, Device, DeviceId, GeoPoint, SensorReading};
pub use risk::{evaluate_risk, Criterion, RiskAssessment, RiskLevel, RiskModel, SubScores};
