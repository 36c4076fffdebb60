//! JSON snapshot feed adapter
//!
//! Reads an array of raw device readings from a file on every fetch.
//! Useful for replaying a captured gateway dump or for running the host
//! without hardware.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::reading::f64_or_nan;
use crate::domain::{Calibration, Device};
use crate::feed_protocol::RawReading;
use crate::ports::feed::{FeedError, SensorFeedPort};

/// One record of a snapshot file.
///
/// Matches `RawReading`, except that `smoke_raw` may be a number, a
/// numeric string, `null`, or missing. Anything unusable is kept as NaN
/// so the feed can report it before it is scored as zero.
#[derive(Debug, Deserialize)]
struct SnapshotRecord {
    device_id: u16,
    #[serde(default)]
    name: String,
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
    #[serde(default)]
    timestamp_s: i64,
    temperature_c: f64,
    air_humidity: f64,
    soil_raw: f64,
    heat_index_c: f64,
    #[serde(default = "missing_smoke", deserialize_with = "f64_or_nan")]
    smoke_raw: f64,
}

fn missing_smoke() -> f64 {
    f64::NAN
}

impl SnapshotRecord {
    fn into_raw(self) -> RawReading {
        RawReading {
            device_id: self.device_id,
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp_s: self.timestamp_s,
            temperature_c: self.temperature_c,
            air_humidity: self.air_humidity,
            soil_raw: self.soil_raw,
            heat_index_c: self.heat_index_c,
            smoke_raw: self.smoke_raw,
        }
    }
}

/// Parse a snapshot document into raw readings
pub fn parse_snapshot(json: &str) -> Result<Vec<RawReading>, FeedError> {
    let records: Vec<SnapshotRecord> = serde_json::from_str(json)?;
    Ok(records.into_iter().map(SnapshotRecord::into_raw).collect())
}

/// Feed backed by a JSON snapshot file
pub struct JsonFileFeed {
    path: PathBuf,
    label: String,
    calibration: Calibration,
}

impl JsonFileFeed {
    pub fn new(path: impl AsRef<Path>, calibration: Calibration) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            label: path.display().to_string(),
            path,
            calibration,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SensorFeedPort for JsonFileFeed {
    fn fetch(&mut self) -> Result<Vec<Device>, FeedError> {
        let json = fs::read_to_string(&self.path)?;
        let raw = parse_snapshot(&json)?;
        debug!("Loaded {} readings from {}", raw.len(), self.label);

        Ok(raw
            .iter()
            .map(|r| {
                if r.smoke_is_malformed() {
                    warn!(
                        "Device {} has no usable smoke value in {}, scoring it as 0",
                        r.device_id, self.label
                    );
                }
                r.to_device(&self.calibration)
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.label
    }
}
