//! Adapters - concrete implementations of ports
//!
//! Adapters connect the domain to the outside world by implementing
//! the port traits. Each adapter knows how to work with a specific
//! transport or file format.
//!
//! # Available Adapters
//!
//! - **serial_feed**: field gateway over USB CDC serial (postcard + COBS)
//! - **json_file**: JSON snapshot of raw readings on disk

pub mod json_file;
pub mod serial_feed;

pub use json_file::JsonFileFeed;
pub use serial_feed::{find_gateway_port, list_ports, GatewayDiagnostics, SerialFeedAdapter};
