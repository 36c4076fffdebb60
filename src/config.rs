//! Host configuration from the environment
//!
//! Every setting has a default; unset variables are logged and fall back
//! to it. Command-line flags in the host binary override these values.

use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::domain::{Calibration, SmokeCalibration, SoilCalibration};
use crate::monitor::RefreshConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct HostConfig {
    /// Gateway serial port; auto-detected when unset
    pub port: Option<String>,
    pub baud_rate: u32,
    pub timeout: Duration,
    pub refresh: RefreshConfig,
    /// Read readings from this snapshot file instead of a gateway
    pub feed_file: Option<PathBuf>,
    pub calibration: Calibration,
}

impl HostConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let timeout_ms: u64 = try_load(&lookup, "FIREWATCH_TIMEOUT_MS", "30000")?;
        let refresh_secs: u64 = try_load(&lookup, "FIREWATCH_REFRESH_SECS", "30")?;
        let smoke_ceiling: f64 = try_load(&lookup, "FIREWATCH_SMOKE_CEILING", "4.8")?;

        if !(smoke_ceiling.is_finite() && smoke_ceiling > 0.0) {
            return Err(ConfigError::Invalid {
                key: "FIREWATCH_SMOKE_CEILING",
                value: smoke_ceiling.to_string(),
                reason: "must be a positive number".to_string(),
            });
        }
        if refresh_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "FIREWATCH_REFRESH_SECS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            port: lookup("FIREWATCH_PORT"),
            baud_rate: try_load(&lookup, "FIREWATCH_BAUD", "115200")?,
            timeout: Duration::from_millis(timeout_ms),
            refresh: RefreshConfig::every(Duration::from_secs(refresh_secs)),
            feed_file: lookup("FIREWATCH_FEED_FILE").map(PathBuf::from),
            calibration: Calibration::new(
                SmokeCalibration::new(smoke_ceiling),
                SoilCalibration::new(
                    try_load(&lookup, "FIREWATCH_SOIL_SLOPE", "-65.79")?,
                    try_load(&lookup, "FIREWATCH_SOIL_OFFSET", "169.08")?,
                ),
            ),
        })
    }
}

fn try_load<L, T>(lookup: &L, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            value: value.clone(),
            reason: e.to_string(),
        }
    })
}
