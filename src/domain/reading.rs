//! Sensor reading domain entity
//!
//! This module defines the per-device reading that the risk evaluator
//! consumes, plus the device it belongs to. It has no knowledge of how
//! readings are fetched or displayed.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Normalized readings for one device in one refresh cycle.
///
/// Fields are never clamped: out-of-range humidity values are accepted as
/// diagnostic signals. The one exception is `smoke_percent`, which is
/// coerced to `0.0` whenever it is not a finite number.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Air temperature in Celsius
    pub temperature: f64,
    /// Relative air humidity in percent
    pub air_humidity: f64,
    /// Soil moisture in percent (may be negative or above 100)
    pub soil_humidity: f64,
    /// "Feels-like" temperature in Celsius
    pub heat_index: f64,
    /// Smoke concentration in percent of the sensor ceiling
    #[serde(default, deserialize_with = "lenient_f64")]
    pub smoke_percent: f64,
}

impl SensorReading {
    /// Create a reading, sanitizing the smoke value
    pub fn new(
        temperature: f64,
        air_humidity: f64,
        soil_humidity: f64,
        heat_index: f64,
        smoke_percent: f64,
    ) -> Self {
        Self {
            temperature,
            air_humidity,
            soil_humidity,
            heat_index,
            smoke_percent: sanitize_smoke(smoke_percent),
        }
    }

    /// Smoke percent as used for scoring (never NaN)
    #[inline]
    pub fn smoke(&self) -> f64 {
        sanitize_smoke(self.smoke_percent)
    }
}

/// Replace a non-finite smoke value with `0.0`.
#[inline]
pub fn sanitize_smoke(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Parse a smoke value from text, falling back to `0.0`.
pub fn parse_smoke(text: &str) -> f64 {
    text.trim().parse::<f64>().map(sanitize_smoke).unwrap_or(0.0)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Deserialize a number that may arrive as a number, a numeric string,
/// `null`, or garbage. Anything unusable becomes NaN.
pub(crate) fn f64_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Number(v)) => v,
        Some(Loose::Text(s)) => s.trim().parse().unwrap_or(f64::NAN),
        Some(Loose::Other(_)) | None => f64::NAN,
    })
}

/// Like [`f64_or_nan`], but anything unusable becomes `0.0`.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64_or_nan(deserializer).map(sanitize_smoke)
}

/// Device identifier as assigned by the gateway
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub u16);

impl DeviceId {
    /// Create a new device ID from a raw value
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// WGS84 position of a device, used for map placement
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A field device and its latest normalized reading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub location: GeoPoint,
    /// Seconds since the Unix epoch, as reported by the feed
    pub timestamp_s: i64,
    pub reading: SensorReading,
}

impl Device {
    pub fn new(
        id: DeviceId,
        name: impl Into<String>,
        location: GeoPoint,
        timestamp_s: i64,
        reading: SensorReading,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            timestamp_s,
            reading,
        }
    }
}
