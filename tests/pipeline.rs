//! Feed -> evaluate -> summarize, through the public API

use std::fs;
use std::time::Duration;

use firewatch::domain::risk::points_to_percent;
use firewatch::query::parse_query;
use firewatch::{
    Calibration, Device, DeviceId, FeedError, GeoPoint, JsonFileFeed, Monitor, RefreshConfig,
    RiskLevel, SensorFeedPort, SensorReading,
};

const SNAPSHOT: &str = r#"[
    {"device_id": 10, "name": "cerrado-east", "latitude": -15.61, "longitude": -47.65,
     "timestamp_s": 1760000000, "temperature_c": 24.0, "air_humidity": 65.0,
     "soil_raw": 1.9, "heat_index_c": 25.0, "smoke_raw": 0.12},
    {"device_id": 11, "name": "cerrado-west", "latitude": -15.70, "longitude": -48.10,
     "timestamp_s": 1760000000, "temperature_c": 38.0, "air_humidity": 10.0,
     "soil_raw": 2.5, "heat_index_c": 42.0, "smoke_raw": 0.62},
    {"device_id": 12, "name": "river-bank", "latitude": -15.80, "longitude": -47.90,
     "timestamp_s": 1760000000, "temperature_c": 30.0, "air_humidity": 40.0,
     "soil_raw": 2.2, "heat_index_c": 32.0, "smoke_raw": "broken"}
]"#;

#[test]
fn test_snapshot_file_through_monitor() {
    let path = std::env::temp_dir().join(format!("firewatch-pipeline-{}.json", std::process::id()));
    fs::write(&path, SNAPSHOT).unwrap();

    let feed = JsonFileFeed::new(&path, Calibration::STANDARD);
    let mut monitor = Monitor::new(feed, RefreshConfig::every(Duration::from_secs(1)));
    let snapshot = monitor.tick().unwrap().clone();
    fs::remove_file(&path).unwrap();

    assert_eq!(snapshot.assessments.len(), 3);

    // soil 1.9 V -> 44.1 %, smoke 0.12 V -> 2.5 %: nothing scores
    let east = &snapshot.assessments[0];
    assert_eq!(east.assessment.risk_points, 0);
    assert_eq!(east.assessment.risk_level, RiskLevel::Low);

    // soil 2.5 V -> 4.6 %, smoke 0.62 V -> 12.9 %
    let west = &snapshot.assessments[1];
    assert_eq!(west.assessment.risk_points, 14);
    assert_eq!(west.assessment.risk_percent, 93);
    assert_eq!(west.assessment.risk_level, RiskLevel::Critical);

    // soil 2.2 V -> 24.3 % (1), temp 30 (1), air 40 (1), heat 32 (1),
    // unreadable smoke -> 0 %
    let bank = &snapshot.assessments[2];
    assert_eq!(bank.device.reading.smoke_percent, 0.0);
    assert_eq!(bank.assessment.risk_points, 4);
    assert_eq!(bank.assessment.risk_percent, 27);
    assert_eq!(bank.assessment.risk_level, RiskLevel::Moderate);

    let summary = snapshot.summary.unwrap();
    assert_eq!(summary.device_count, 3);
    assert_eq!(summary.riskiest, DeviceId(11));
    assert_eq!(summary.count(RiskLevel::Low), 1);
    assert_eq!(summary.count(RiskLevel::Moderate), 1);
    assert_eq!(summary.count(RiskLevel::Critical), 1);
    // (24 + 38 + 30) / 3 = 30.666.. -> 30.7
    assert_eq!(summary.mean_temperature, 30.7);
    // (65 + 10 + 40) / 3 = 38.33.. -> 38
    assert_eq!(summary.mean_air_humidity, 38.0);

    let query = parse_query(&["level", ">=", "moderate"]).unwrap();
    let hits: Vec<u16> = query
        .apply(&snapshot.assessments)
        .iter()
        .map(|e| e.device.id.value())
        .collect();
    assert_eq!(hits, vec![11, 12]);
}

/// Feed whose readings change between refreshes
struct DryingFeed {
    soil: f64,
}

impl SensorFeedPort for DryingFeed {
    fn fetch(&mut self) -> Result<Vec<Device>, FeedError> {
        self.soil -= 10.0;
        Ok(vec![Device::new(
            DeviceId(1),
            "plot",
            GeoPoint::default(),
            0,
            SensorReading::new(24.0, 65.0, self.soil, 25.0, 0.0),
        )])
    }

    fn name(&self) -> &str {
        "drying"
    }
}

#[test]
fn test_assessment_follows_latest_reading_only() {
    let mut monitor = Monitor::new(DryingFeed { soil: 45.0 }, RefreshConfig::default());

    let mut points = Vec::new();
    for _ in 0..4 {
        let snapshot = monitor.tick().unwrap();
        points.push(snapshot.assessments[0].assessment.risk_points);
    }

    // soil 35, 25, 15, 5 -> 0, 1, 2, 3 points
    assert_eq!(points, vec![0, 1, 2, 3]);
    assert_eq!(
        monitor.latest().unwrap().assessments[0].assessment.risk_percent,
        points_to_percent(3)
    );
}
