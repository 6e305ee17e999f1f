//! Shared fixtures for engine and store integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use tinysteps::config::{Config, GraduationSettings};
use tinysteps::progress::ActivityEvent;
use tinysteps::store::ProgressStore;
use tinysteps::ProgressEngine;

/// Day `day` of the test calendar (2026-09-01 is day 0) at `hour`:00 UTC
pub fn at(day: i64, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, hour, 0, 0).unwrap() + Duration::days(day)
}

/// A finished activity lasting two minutes
pub fn activity(
    mode: &str,
    finished_at: DateTime<Utc>,
    correct: u32,
    attempts: u32,
    level: u32,
    stars: u32,
) -> ActivityEvent {
    ActivityEvent {
        mode: mode.to_string(),
        started_at: finished_at - Duration::seconds(120),
        finished_at,
        score: correct * 10,
        correct: Some(correct),
        attempts: Some(attempts),
        level,
        stars,
        highest_number: None,
    }
}

/// A perfect run at `level`
pub fn perfect(mode: &str, finished_at: DateTime<Utc>, level: u32) -> ActivityEvent {
    activity(mode, finished_at, 10, 10, level, 3)
}

/// Config with a readiness floor small enough to reach in a few sessions
pub fn quick_config() -> Config {
    Config {
        graduation: GraduationSettings {
            readiness_threshold: 80.0,
            min_sessions: 3,
            min_days: 2,
        },
        ..Config::default()
    }
}

pub fn engine(config: Config) -> ProgressEngine {
    ProgressEngine::from_config(config).expect("built-in catalogs load")
}

/// Fresh store in a temp dir. Keep the `TempDir` alive for the test.
pub fn temp_store() -> (TempDir, ProgressStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = ProgressStore::open(&dir.path().join("progress.db")).expect("Failed to open store");
    (dir, store)
}
