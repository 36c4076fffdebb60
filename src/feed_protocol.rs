//! Shared protocol for sensor gateway communication
//!
//! This module defines the message protocol used between the host and the
//! field gateway that collects raw readings from every fire-risk device.
//!
//! Messages are serialized using `postcard` with COBS encoding for framing.

use serde::{Deserialize, Serialize};

use crate::domain::{Calibration, Device, DeviceId, GeoPoint, SensorReading};

/// Maximum number of readings per response
pub const MAX_READINGS_PER_RESPONSE: usize = 32;

/// Largest accepted frame, sentinel included
pub const MAX_FRAME_SIZE: usize = 65536;

/// COBS frame terminator
pub const FRAME_SENTINEL: u8 = 0x00;

/// Command sent from host to gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedCommand {
    /// Liveness check, answered with `FeedResponse::Ok`
    Ping,

    /// Latest reading of every device, paged from `offset`
    Latest { offset: u32 },

    /// Latest reading of a single device
    GetDevice { id: u16 },

    /// Gateway diagnostics
    Diagnostics,
}

impl FeedCommand {
    pub fn ping() -> Self {
        Self::Ping
    }

    pub fn latest(offset: u32) -> Self {
        Self::Latest { offset }
    }

    pub fn get_device(id: DeviceId) -> Self {
        Self::GetDevice { id: id.value() }
    }

    pub fn diagnostics() -> Self {
        Self::Diagnostics
    }
}

/// Unconverted device reading as reported by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub device_id: u16,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Seconds since the Unix epoch
    pub timestamp_s: i64,
    /// Air temperature in Celsius
    pub temperature_c: f64,
    /// Relative air humidity in percent
    pub air_humidity: f64,
    /// Raw soil probe value (volts)
    pub soil_raw: f64,
    /// Heat index in Celsius
    pub heat_index_c: f64,
    /// Raw smoke probe value (volts)
    pub smoke_raw: f64,
}

impl RawReading {
    /// Whether the smoke value has to be coerced to zero
    pub fn smoke_is_malformed(&self) -> bool {
        !self.smoke_raw.is_finite()
    }

    /// Apply unit conversions and build the domain device
    pub fn to_device(&self, calibration: &Calibration) -> Device {
        let reading = SensorReading::new(
            self.temperature_c,
            self.air_humidity,
            calibration.soil.raw_to_percent(self.soil_raw),
            self.heat_index_c,
            calibration.smoke.raw_to_percent(self.smoke_raw),
        );

        Device::new(
            DeviceId(self.device_id),
            self.name.clone(),
            GeoPoint::new(self.latitude, self.longitude),
            self.timestamp_s,
            reading,
        )
    }
}

/// Response sent from gateway to host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedResponse {
    /// Success
    Ok,

    /// Error message
    Error { message: String },

    /// A batch of device readings
    Readings {
        data: Vec<RawReading>,
        total: u32,
        has_more: bool,
    },

    /// Single reading response (for GetDevice)
    SingleReading { reading: Option<RawReading> },

    /// Gateway diagnostics
    Diagnostics {
        /// Devices registered with the gateway
        devices_known: u16,
        /// Devices that reported within the last polling window
        devices_reporting: u16,
        /// Radio packets that failed CRC
        packets_dropped: u32,
        /// Gateway uptime in milliseconds
        uptime_ms: u64,
    },
}

impl FeedResponse {
    pub fn error(msg: &str) -> Self {
        Self::Error {
            message: msg.to_string(),
        }
    }

    /// Create a readings response, capped at `MAX_READINGS_PER_RESPONSE`
    pub fn readings(readings: &[RawReading], total: u32, has_more: bool) -> Self {
        let capped = readings.len() > MAX_READINGS_PER_RESPONSE;
        Self::Readings {
            data: readings
                .iter()
                .take(MAX_READINGS_PER_RESPONSE)
                .cloned()
                .collect(),
            total,
            has_more: has_more || capped,
        }
    }
}

/// Serialize a message into a COBS frame (terminator included)
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, postcard::Error> {
    postcard::to_allocvec_cobs(message)
}

/// Decode a COBS frame in place
pub fn decode_frame<'a, T: Deserialize<'a>>(frame: &'a mut [u8]) -> Result<T, postcard::Error> {
    postcard::from_bytes_cobs(frame)
}
