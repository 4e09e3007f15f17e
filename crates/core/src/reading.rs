//! Battery readings and the retained 24-hour history.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voltlog_platform::{clamp_level, BatteryInfo, ChargeState};

/// How long readings are retained, in hours.
pub const RETENTION_HOURS: i64 = 24;

/// Oldest timestamp that survives retention at `now`.
pub fn retention_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(RETENTION_HOURS)
}

/// One timestamped battery sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredReading", into = "StoredReading")]
pub struct BatteryReading {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: f32,
    pub state: ChargeState,
}

impl BatteryReading {
    /// Create a reading with a fresh id.
    ///
    /// Timestamps are kept at microsecond precision so they survive the
    /// floating-point seconds used on disk.
    pub fn new(timestamp: DateTime<Utc>, level: f32, state: ChargeState) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp.trunc_subsecs(6),
            level: clamp_level(level),
            state,
        }
    }

    pub fn from_info(timestamp: DateTime<Utc>, info: BatteryInfo) -> Self {
        Self::new(timestamp, info.level, info.state)
    }

    pub fn percent(&self) -> u8 {
        (self.level * 100.0).round() as u8
    }
}

/// On-disk shape: `{id, timestamp (epoch seconds), level, state (integer code)}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredReading {
    id: Uuid,
    timestamp: f64,
    level: f32,
    state: i32,
}

impl From<BatteryReading> for StoredReading {
    fn from(reading: BatteryReading) -> Self {
        Self {
            id: reading.id,
            timestamp: reading.timestamp.timestamp_micros() as f64 / 1_000_000.0,
            level: reading.level,
            state: reading.state.code(),
        }
    }
}

impl From<StoredReading> for BatteryReading {
    fn from(stored: StoredReading) -> Self {
        let micros = (stored.timestamp * 1_000_000.0).round() as i64;
        Self {
            id: stored.id,
            timestamp: DateTime::from_timestamp_micros(micros).unwrap_or(DateTime::UNIX_EPOCH),
            level: clamp_level(stored.level),
            state: ChargeState::from_code(stored.state),
        }
    }
}

/// Readings in ascending timestamp order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<BatteryReading>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from readings in any order. Sorting is stable, so readings
    /// sharing a timestamp keep their relative order.
    pub fn from_readings(mut entries: Vec<BatteryReading>) -> Self {
        entries.sort_by_key(|r| r.timestamp);
        Self { entries }
    }

    /// Append a reading. Callers pass readings taken at or after the latest
    /// entry, which keeps the log ordered.
    pub fn push(&mut self, reading: BatteryReading) {
        self.entries.push(reading);
    }

    /// Drop every reading older than the retention window at `now`.
    /// Returns how many were evicted.
    pub fn retain_window(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = retention_cutoff(now);
        let before = self.entries.len();
        self.entries.retain(|r| r.timestamp >= cutoff);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&BatteryReading> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &BatteryReading> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[BatteryReading] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<BatteryReading> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_retention_drops_entries_older_than_24_hours() {
        let now = Utc::now();
        let old = BatteryReading::new(now - Duration::hours(25), 0.5, ChargeState::Unplugged);
        let recent = BatteryReading::new(now, 0.8, ChargeState::Charging);

        let mut log = HistoryLog::from_readings(vec![old, recent.clone()]);
        let evicted = log.retain_window(now);

        assert_eq!(evicted, 1);
        assert_eq!(log.as_slice(), &[recent]);
        assert_eq!(log.latest().map(|r| r.level), Some(0.8));
    }

    #[test]
    fn test_retention_keeps_entry_exactly_at_cutoff() {
        let now = Utc::now().trunc_subsecs(6);
        let boundary = BatteryReading::new(retention_cutoff(now), 0.4, ChargeState::Unplugged);
        let mut log = HistoryLog::from_readings(vec![boundary]);

        assert_eq!(log.retain_window(now), 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_from_readings_sorts_by_timestamp() {
        let now = Utc::now();
        let a = BatteryReading::new(now - Duration::minutes(20), 0.9, ChargeState::Unplugged);
        let b = BatteryReading::new(now - Duration::minutes(10), 0.85, ChargeState::Unplugged);
        let c = BatteryReading::new(now, 0.8, ChargeState::Unplugged);

        let log = HistoryLog::from_readings(vec![c.clone(), a.clone(), b.clone()]);
        assert_eq!(log.into_vec(), vec![a, b, c]);
    }

    #[test]
    fn test_readings_get_distinct_ids() {
        let now = Utc::now();
        let a = BatteryReading::new(now, 0.5, ChargeState::Unknown);
        let b = BatteryReading::new(now, 0.5, ChargeState::Unknown);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_stored_layout() {
        let timestamp = DateTime::from_timestamp(1_752_900_000, 250_000_000).unwrap();
        let reading = BatteryReading::new(timestamp, 0.75, ChargeState::Charging);

        let value = serde_json::to_value(&reading).unwrap();
        assert_eq!(value["id"], serde_json::json!(reading.id.to_string()));
        assert_eq!(value["timestamp"], serde_json::json!(1_752_900_000.25));
        assert_eq!(value["level"], serde_json::json!(0.75));
        assert_eq!(value["state"], serde_json::json!(2));
    }

    #[test]
    fn test_decode_unknown_state_code() {
        let json = r#"{"id":"6f1c3c52-4a8e-4c55-9a77-0f2b9a4e5d10","timestamp":1752900000.0,"level":0.5,"state":9}"#;
        let reading: BatteryReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.state, ChargeState::Unknown);
        assert_eq!(reading.timestamp.timestamp(), 1_752_900_000);
    }

    #[test]
    fn test_decode_clamps_level() {
        let json = r#"{"id":"6f1c3c52-4a8e-4c55-9a77-0f2b9a4e5d10","timestamp":1752900000.0,"level":1.7,"state":3}"#;
        let reading: BatteryReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.level, 1.0);
    }
}
