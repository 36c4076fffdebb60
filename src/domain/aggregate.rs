//! Fleet aggregation
//!
//! Re-derives every device's assessment and the dashboard summary tiles
//! from the current device collection. Nothing is carried between calls.

use serde::{Deserialize, Serialize};

use crate::domain::calibration::round_to_tenth;
use crate::domain::risk::{evaluate_risk, RiskAssessment, RiskLevel};
use crate::domain::{Device, DeviceId};

/// A device together with the assessment of its latest reading
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceAssessment {
    pub device: Device,
    pub assessment: RiskAssessment,
}

/// Summary tiles for a device collection.
///
/// Means are unweighted and rounded for display: temperature, heat index
/// and smoke to one decimal, both humidities to whole percent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub device_count: usize,
    pub mean_temperature: f64,
    pub mean_air_humidity: f64,
    pub mean_soil_humidity: f64,
    pub mean_heat_index: f64,
    pub mean_smoke_percent: f64,
    /// Device count per level, in `RiskLevel::ALL` order
    pub level_counts: [usize; 4],
    /// Highest `risk_points`; the first such device wins ties
    pub riskiest: DeviceId,
}

impl FleetSummary {
    pub fn count(&self, level: RiskLevel) -> usize {
        self.level_counts[level.index()]
    }
}

/// Assess every device in input order
pub fn assess_devices(devices: &[Device]) -> Vec<DeviceAssessment> {
    devices
        .iter()
        .map(|device| DeviceAssessment {
            assessment: evaluate_risk(&device.reading),
            device: device.clone(),
        })
        .collect()
}

/// Compute the summary tiles; `None` for an empty collection
pub fn summarize(devices: &[Device]) -> Option<FleetSummary> {
    let (first, _) = devices.split_first()?;

    let mut sums = [0.0f64; 5];
    let mut level_counts = [0usize; 4];
    let mut riskiest = (first.id, 0u8);

    for device in devices {
        let r = &device.reading;
        sums[0] += r.temperature;
        sums[1] += r.air_humidity;
        sums[2] += r.soil_humidity;
        sums[3] += r.heat_index;
        sums[4] += r.smoke();

        let assessment = evaluate_risk(r);
        level_counts[assessment.risk_level.index()] += 1;
        if assessment.risk_points > riskiest.1 {
            riskiest = (device.id, assessment.risk_points);
        }
    }

    let n = devices.len() as f64;
    let mean = |i: usize| sums[i] / n;

    Some(FleetSummary {
        device_count: devices.len(),
        mean_temperature: round_to_tenth(mean(0)),
        mean_air_humidity: mean(1).round(),
        mean_soil_humidity: mean(2).round(),
        mean_heat_index: round_to_tenth(mean(3)),
        mean_smoke_percent: round_to_tenth(mean(4)),
        level_counts,
        riskiest: riskiest.0,
    })
}
