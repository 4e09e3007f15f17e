//! Glanceable gauge timeline.
//!
//! The gauge reads the sensor directly rather than going through the
//! sampler, and asks to be refreshed on its own fixed schedule.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;
use voltlog_platform::BatterySensor;

pub const DEFAULT_LOW_THRESHOLD: f32 = 0.2;
pub const DEFAULT_REFRESH_MINS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugePolicy {
    /// Levels strictly below this are flagged as low.
    pub low_threshold: f32,
    pub refresh: Duration,
}

impl Default for GaugePolicy {
    fn default() -> Self {
        Self {
            low_threshold: DEFAULT_LOW_THRESHOLD,
            refresh: Duration::minutes(DEFAULT_REFRESH_MINS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeEntry {
    pub date: DateTime<Utc>,
    pub level: f32,
    pub percent: u8,
    pub low: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub entries: Vec<GaugeEntry>,
    pub refresh_at: DateTime<Utc>,
}

/// Build a single-entry timeline from a fresh sensor read. Monitoring is
/// switched on for the read if needed and restored afterwards.
pub fn timeline(
    sensor: &mut dyn BatterySensor,
    now: DateTime<Utc>,
    policy: GaugePolicy,
) -> Timeline {
    let was_enabled = sensor.is_monitoring_enabled();
    if !was_enabled {
        sensor.set_monitoring_enabled(true);
    }

    let info = sensor.read().unwrap_or_else(|e| {
        warn!(error = %e, "Battery sensor unavailable for gauge");
        Default::default()
    });

    if !was_enabled {
        sensor.set_monitoring_enabled(false);
    }

    Timeline {
        entries: vec![GaugeEntry {
            date: now,
            level: info.level,
            percent: info.percent(),
            low: info.level < policy.low_threshold,
        }],
        refresh_at: now + policy.refresh,
    }
}
