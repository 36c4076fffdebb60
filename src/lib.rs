//! Firewatch fire-risk library
//!
//! This library scores fire risk from field sensor readings and provides
//! a hexagonal architecture for fetching those readings from a gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                                 │
//! │  - SensorReading / Device entities                               │
//! │  - Smoke and soil calibration                                    │
//! │  - Risk evaluation and fleet aggregation                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Ports (Traits)                               │
//! │  - SensorFeedPort: fetch the latest reading of every device      │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters                                     │
//! │  - SerialFeedAdapter: gateway over USB CDC serial                │
//! │  - JsonFileFeed: snapshot file                                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The domain layer is pure: every assessment is recomputed from the
//! latest reading and nothing is kept between refreshes.
//!
//! # Example
//!
//! ```
//! use firewatch::{evaluate_risk, RiskLevel, SensorReading};
//!
//! let reading = SensorReading::new(38.0, 10.0, 5.0, 42.0, 12.9);
//! let assessment = evaluate_risk(&reading);
//!
//! assert_eq!(assessment.risk_points, 14);
//! assert_eq!(assessment.risk_percent, 93);
//! assert_eq!(assessment.risk_level, RiskLevel::Critical);
//! ```

// ============================================================================
// Protocol (shared between host and gateway)
// ============================================================================

pub mod feed_protocol;

pub use feed_protocol::{FeedCommand, FeedResponse, RawReading, MAX_READINGS_PER_RESPONSE};

// ============================================================================
// Hexagonal Architecture
// ============================================================================

/// Domain layer - pure business logic
pub mod domain;

/// Ports - traits defining boundaries
pub mod ports;

/// Adapters - concrete implementations
pub mod adapters;

pub mod config;
pub mod monitor;
pub mod query;

// Re-export key domain types
pub use domain::{
    assess_devices, convert_smoke_to_percent, convert_soil_humidity_to_percent, evaluate_risk,
    summarize, Calibration, Criterion, Device, DeviceAssessment, DeviceId, FleetSummary, GeoPoint,
    RiskAssessment, RiskLevel, RiskModel, SensorReading,
};

// Re-export key port traits
pub use ports::{FeedError, SensorFeedPort};

// Re-export adapters
pub use adapters::{JsonFileFeed, SerialFeedAdapter};

pub use config::HostConfig;
pub use monitor::{Monitor, RefreshConfig, Snapshot};
