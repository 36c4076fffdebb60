//! Serial gateway feed adapter
//!
//! This adapter implements the SensorFeedPort trait for a field gateway
//! attached over USB CDC serial. Commands and responses are postcard
//! messages framed with COBS.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{FlowControl, SerialPort, SerialPortInfo, SerialPortType};
use tracing::{debug, info, warn};

use crate::domain::{Calibration, Device, DeviceId};
use crate::feed_protocol::{
    decode_frame, encode_frame, FeedCommand, FeedResponse, RawReading, FRAME_SENTINEL,
    MAX_FRAME_SIZE,
};
use crate::ports::feed::{FeedError, SensorFeedPort};

/// Raspberry Pi USB vendor ID, reported by the RP2350-based gateway
pub const GATEWAY_USB_VID: u16 = 0x2e8a;

/// Gateway state as reported by `FeedCommand::Diagnostics`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GatewayDiagnostics {
    pub devices_known: u16,
    pub devices_reporting: u16,
    pub packets_dropped: u32,
    pub uptime_ms: u64,
}

/// Sensor gateway reached over a byte stream
///
/// Generic over the transport so the framing can be driven by anything
/// that reads and writes bytes; production code uses a serial port.
pub struct SerialFeedAdapter<T> {
    port: T,
    port_name: String,
    calibration: Calibration,
}

impl SerialFeedAdapter<Box<dyn SerialPort>> {
    /// Open the gateway serial port and raise DTR
    ///
    /// Some CDC devices do not transmit until DTR is set.
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        timeout: Duration,
        calibration: Calibration,
    ) -> Result<Self, FeedError> {
        let mut port = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .flow_control(FlowControl::None)
            .open()?;
        port.write_data_terminal_ready(true)?;

        info!("Opened gateway port {port_name} at {baud_rate} baud");

        Ok(Self::new(port, port_name, calibration))
    }
}

impl<T: Read + Write> SerialFeedAdapter<T> {
    pub fn new(port: T, port_name: impl Into<String>, calibration: Calibration) -> Self {
        Self {
            port,
            port_name: port_name.into(),
            calibration,
        }
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = calibration;
    }

    /// Send one command and wait for its response
    ///
    /// A `FeedResponse::Error` from the gateway is turned into
    /// `FeedError::Gateway`.
    pub fn request(&mut self, command: &FeedCommand) -> Result<FeedResponse, FeedError> {
        let frame = encode_frame(command)?;
        self.port.write_all(&frame)?;
        self.port.flush()?;

        let mut rx_buf = self.read_frame()?;
        let response: FeedResponse = decode_frame(&mut rx_buf)?;

        match response {
            FeedResponse::Error { message } => Err(FeedError::Gateway { message }),
            other => Ok(other),
        }
    }

    /// Check that the gateway answers
    pub fn ping(&mut self) -> Result<(), FeedError> {
        match self.request(&FeedCommand::ping())? {
            FeedResponse::Ok => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    pub fn diagnostics(&mut self) -> Result<GatewayDiagnostics, FeedError> {
        match self.request(&FeedCommand::diagnostics())? {
            FeedResponse::Diagnostics {
                devices_known,
                devices_reporting,
                packets_dropped,
                uptime_ms,
            } => Ok(GatewayDiagnostics {
                devices_known,
                devices_reporting,
                packets_dropped,
                uptime_ms,
            }),
            other => Err(unexpected(&other)),
        }
    }

    /// Fetch every raw reading, following `has_more` pages
    pub fn fetch_raw(&mut self) -> Result<Vec<RawReading>, FeedError> {
        let mut readings = Vec::new();

        loop {
            let offset = readings.len() as u32;
            match self.request(&FeedCommand::latest(offset))? {
                FeedResponse::Readings {
                    data,
                    total,
                    has_more,
                } => {
                    debug!(
                        "Received {} readings at offset {offset} ({total} total)",
                        data.len()
                    );
                    let empty = data.is_empty();
                    readings.extend(data);
                    if !has_more || empty {
                        break;
                    }
                }
                other => return Err(unexpected(&other)),
            }
        }

        Ok(readings)
    }

    /// Read until the COBS sentinel
    fn read_frame(&mut self) -> Result<Vec<u8>, FeedError> {
        let mut rx_buf = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match self.port.read(&mut byte) {
                Ok(1) => {
                    rx_buf.push(byte[0]);
                    if byte[0] == FRAME_SENTINEL {
                        return Ok(rx_buf);
                    }
                    if rx_buf.len() >= MAX_FRAME_SIZE {
                        return Err(FeedError::ResponseTooLarge {
                            limit: MAX_FRAME_SIZE,
                        });
                    }
                }
                Ok(_) => {
                    // Stream closed
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("{} closed after {} bytes", self.port_name, rx_buf.len()),
                    )
                    .into());
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn convert(&self, raw: &RawReading) -> Device {
        if raw.smoke_is_malformed() {
            warn!(
                "Device {} reported non-numeric smoke value, scoring it as 0",
                raw.device_id
            );
        }
        raw.to_device(&self.calibration)
    }
}

impl<T: Read + Write> SensorFeedPort for SerialFeedAdapter<T> {
    fn fetch(&mut self) -> Result<Vec<Device>, FeedError> {
        let raw = self.fetch_raw()?;
        Ok(raw.iter().map(|r| self.convert(r)).collect())
    }

    fn name(&self) -> &str {
        &self.port_name
    }

    fn fetch_device(&mut self, id: DeviceId) -> Result<Option<Device>, FeedError> {
        match self.request(&FeedCommand::get_device(id))? {
            FeedResponse::SingleReading { reading } => Ok(reading.map(|r| self.convert(&r))),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(response: &FeedResponse) -> FeedError {
    FeedError::UnexpectedResponse(format!("{response:?}"))
}

/// List serial ports visible to the host
pub fn list_ports() -> Result<Vec<SerialPortInfo>, FeedError> {
    Ok(serialport::available_ports()?)
}

/// Find the first USB port with the gateway's vendor ID
pub fn find_gateway_port() -> Option<String> {
    let ports = serialport::available_ports().ok()?;

    ports.into_iter().find_map(|port| match &port.port_type {
        SerialPortType::UsbPort(info) if info.vid == GATEWAY_USB_VID => Some(port.port_name),
        _ => None,
    })
}
