//! Feed port - abstraction for fetching device readings
//!
//! This trait allows the application to obtain the current readings of
//! every field device without knowing where they come from (serial
//! gateway, snapshot file, mock).

use crate::domain::{Device, DeviceId};

/// Error type for feed operations
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// No gateway port was found or configured
    #[error("no sensor gateway found")]
    NotConnected,

    /// Serial port could not be opened or configured
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Read or write on the transport failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame could not be encoded or decoded
    #[error("malformed frame: {0}")]
    Frame(#[from] postcard::Error),

    /// Snapshot file is not valid JSON
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// Gateway answered with an error message
    #[error("gateway error: {message}")]
    Gateway { message: String },

    /// Frame exceeded the maximum size before its sentinel arrived
    #[error("response larger than {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// Gateway answered with a response that does not match the command
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Port for fetching device readings
///
/// Each call returns the latest known reading of every device, already
/// converted to domain units. Implementations do not cache between calls.
///
/// # Example Implementation
///
/// ```ignore
/// struct FixedFeed(Vec<Device>);
///
/// impl SensorFeedPort for FixedFeed {
///     fn fetch(&mut self) -> Result<Vec<Device>, FeedError> {
///         Ok(self.0.clone())
///     }
///
///     fn name(&self) -> &str { "fixed" }
/// }
/// ```
pub trait SensorFeedPort {
    /// Fetch the current reading of every device
    fn fetch(&mut self) -> Result<Vec<Device>, FeedError>;

    /// Human-readable source name for logs
    fn name(&self) -> &str;

    /// Fetch a single device by ID
    ///
    /// The default implementation filters a full fetch.
    fn fetch_device(&mut self, id: DeviceId) -> Result<Option<Device>, FeedError> {
        Ok(self.fetch()?.into_iter().find(|d| d.id == id))
    }
}
