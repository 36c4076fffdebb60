//! Periodic refresh of the device collection
//!
//! Every tick fetches the feed and re-derives all assessments and the
//! summary from scratch. Ticks run back to back on the calling thread, so
//! two refreshes never overlap.

use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info, warn};

use crate::domain::{assess_devices, summarize, DeviceAssessment, FleetSummary};
use crate::ports::feed::{FeedError, SensorFeedPort};

/// How often the feed is polled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshConfig {
    pub interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

impl RefreshConfig {
    pub const fn every(interval: Duration) -> Self {
        Self { interval }
    }

    /// Poll fast while a fire is being tracked
    pub const fn incident() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }

    /// Poll slowly during the wet season
    pub const fn low_power() -> Self {
        Self {
            interval: Duration::from_secs(300),
        }
    }
}

/// Result of one successful refresh
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub assessments: Vec<DeviceAssessment>,
    /// `None` when the feed returned no devices
    pub summary: Option<FleetSummary>,
    pub taken_at: SystemTime,
}

/// Tick counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub ticks: u64,
    pub failed_fetches: u64,
    /// Ticks that took longer than the refresh interval
    pub overruns: u64,
    pub slowest_tick: Duration,
}

/// Polls a feed and keeps the latest snapshot
pub struct Monitor<F> {
    feed: F,
    config: RefreshConfig,
    latest: Option<Snapshot>,
    stats: MonitorStats,
}

impl<F: SensorFeedPort> Monitor<F> {
    pub fn new(feed: F, config: RefreshConfig) -> Self {
        Self {
            feed,
            config,
            latest: None,
            stats: MonitorStats::default(),
        }
    }

    pub fn feed_mut(&mut self) -> &mut F {
        &mut self.feed
    }

    pub fn config(&self) -> RefreshConfig {
        self.config
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Fetch once and rebuild the snapshot
    ///
    /// On a failed fetch the previous snapshot is kept and the error is
    /// returned.
    pub fn tick(&mut self) -> Result<&Snapshot, FeedError> {
        let start = Instant::now();

        let refreshed = self.feed.fetch().map(|devices| {
            debug!("Fetched {} devices from {}", devices.len(), self.feed.name());
            Snapshot {
                assessments: assess_devices(&devices),
                summary: summarize(&devices),
                taken_at: SystemTime::now(),
            }
        });

        self.record_tick(start.elapsed(), refreshed.is_err());

        match refreshed {
            Ok(snapshot) => Ok(self.latest.insert(snapshot)),
            Err(e) => {
                warn!("Refresh from {} failed: {e}", self.feed.name());
                Err(e)
            }
        }
    }

    fn record_tick(&mut self, elapsed: Duration, failed: bool) {
        self.stats.ticks += 1;
        if failed {
            self.stats.failed_fetches += 1;
        }
        if elapsed > self.config.interval {
            self.stats.overruns += 1;
        }
        if elapsed > self.stats.slowest_tick {
            self.stats.slowest_tick = elapsed;
        }
    }

    /// Tick on the configured interval
    ///
    /// `on_snapshot` sees every successful refresh. Stops after
    /// `max_ticks` ticks when given, otherwise runs until the process ends.
    /// `Some(0)` returns without ticking.
    pub fn run<C>(&mut self, max_ticks: Option<u64>, mut on_snapshot: C)
    where
        C: FnMut(&Snapshot),
    {
        if max_ticks == Some(0) {
            return;
        }

        info!(
            "Refreshing {} every {:?}",
            self.feed.name(),
            self.config.interval
        );

        let mut remaining = max_ticks;
        loop {
            let cycle_start = Instant::now();

            if let Ok(snapshot) = self.tick() {
                on_snapshot(snapshot);
            }

            if let Some(n) = remaining.as_mut() {
                *n = n.saturating_sub(1);
                if *n == 0 {
                    break;
                }
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.config.interval {
                std::thread::sleep(self.config.interval - elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Device, DeviceId, GeoPoint, RiskLevel, SensorReading};

    /// Feed that replays scripted results
    struct ScriptedFeed {
        script: Vec<Result<Vec<Device>, FeedError>>,
    }

    impl SensorFeedPort for ScriptedFeed {
        fn fetch(&mut self) -> Result<Vec<Device>, FeedError> {
            if self.script.is_empty() {
                return Ok(Vec::new());
            }
            self.script.remove(0)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn device(id: u16, reading: SensorReading) -> Device {
        Device::new(DeviceId(id), "unit", GeoPoint::default(), 0, reading)
    }

    fn hot() -> SensorReading {
        SensorReading::new(38.0, 10.0, 5.0, 42.0, 12.9)
    }

    fn calm() -> SensorReading {
        SensorReading::new(24.0, 65.0, 40.0, 25.0, 2.5)
    }

    #[test]
    fn test_tick_rebuilds_snapshot() {
        let feed = ScriptedFeed {
            script: vec![Ok(vec![device(1, calm())]), Ok(vec![device(1, hot())])],
        };
        let mut monitor = Monitor::new(feed, RefreshConfig::default());

        let first = monitor.tick().unwrap();
        assert_eq!(first.assessments[0].assessment.risk_level, RiskLevel::Low);

        let second = monitor.tick().unwrap();
        assert_eq!(second.assessments[0].assessment.risk_level, RiskLevel::Critical);
        assert_eq!(monitor.stats().ticks, 2);
    }

    #[test]
    fn test_failed_fetch_keeps_previous_snapshot() {
        let feed = ScriptedFeed {
            script: vec![
                Ok(vec![device(1, hot())]),
                Err(FeedError::NotConnected),
            ],
        };
        let mut monitor = Monitor::new(feed, RefreshConfig::default());

        monitor.tick().unwrap();
        assert!(matches!(monitor.tick(), Err(FeedError::NotConnected)));

        let kept = monitor.latest().unwrap();
        assert_eq!(kept.assessments.len(), 1);
        assert_eq!(monitor.stats().failed_fetches, 1);
    }

    #[test]
    fn test_empty_feed_has_no_summary() {
        let feed = ScriptedFeed { script: Vec::new() };
        let mut monitor = Monitor::new(feed, RefreshConfig::default());
        let snapshot = monitor.tick().unwrap();
        assert!(snapshot.assessments.is_empty());
        assert!(snapshot.summary.is_none());
    }

    #[test]
    fn test_run_stops_after_max_ticks() {
        let feed = ScriptedFeed {
            script: vec![
                Ok(vec![device(1, calm())]),
                Err(FeedError::NotConnected),
                Ok(vec![device(1, hot()), device(2, calm())]),
            ],
        };
        let mut monitor = Monitor::new(feed, RefreshConfig::every(Duration::from_millis(1)));

        let mut seen = Vec::new();
        monitor.run(Some(3), |s| seen.push(s.assessments.len()));

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(monitor.stats().ticks, 3);
        assert_eq!(monitor.stats().failed_fetches, 1);
    }

    #[test]
    fn test_run_with_zero_ticks_does_nothing() {
        let feed = ScriptedFeed {
            script: vec![Ok(vec![device(1, hot())])],
        };
        let mut monitor = Monitor::new(feed, RefreshConfig::default());

        let mut seen = 0;
        monitor.run(Some(0), |_| seen += 1);

        assert_eq!(seen, 0);
        assert_eq!(monitor.stats().ticks, 0);
        assert!(monitor.latest().is_none());
    }

    #[test]
    fn test_refresh_presets() {
        assert_eq!(RefreshConfig::default().interval, Duration::from_secs(30));
        assert!(RefreshConfig::incident().interval < RefreshConfig::default().interval);
        assert!(RefreshConfig::low_power().interval > RefreshConfig::default().interval);
    }
}
