//! Ports (interfaces) defining the boundaries of the application
//!
//! Ports are traits that define how the domain interacts with external systems.
//! They allow the domain to remain independent of specific implementations.
//!
//! - **SensorFeedPort**: How we obtain device readings (serial gateway, JSON snapshot, mock)

pub mod feed;

pub use feed::{FeedError, SensorFeedPort};
