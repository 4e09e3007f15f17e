//! Battery sampling with 24-hour retention and write-through persistence.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use voltlog_platform::{BatteryInfo, BatterySensor, ChargeState};

use crate::persistence;
use crate::reading::{BatteryReading, HistoryLog};
use crate::store::SettingsStore;

pub const DEFAULT_INTERVAL_SECS: u64 = 600;

/// Upper bound on the interval: one week.
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SamplerError {
    #[error("Sampling interval must be between 1 and {max} seconds, got {0}", max = MAX_INTERVAL_SECS)]
    InvalidInterval(u64),

    #[error("Sampler has been shut down")]
    Stopped,
}

/// Check that `secs` is a usable sampling interval.
pub fn validate_interval(secs: u64) -> Result<u64, SamplerError> {
    if secs == 0 || secs > MAX_INTERVAL_SECS {
        return Err(SamplerError::InvalidInterval(secs));
    }
    Ok(secs)
}

/// Published state: what a display layer renders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub level: f32,
    pub state: ChargeState,
    pub history: HistoryLog,
    pub interval_secs: u64,
}

/// Owns the current reading, the retained history and the interval.
///
/// Every mutation persists to the settings store and publishes a fresh
/// [`Snapshot`] to subscribers. Scheduling lives in [`crate::Monitor`].
pub struct Sampler {
    sensor: Box<dyn BatterySensor>,
    store: Box<dyn SettingsStore>,
    current: BatteryInfo,
    history: HistoryLog,
    interval_secs: u64,
    updates: watch::Sender<Snapshot>,
    active: bool,
}

impl Sampler {
    /// Enable monitoring, load persisted state and repair stale history.
    /// The current reading is refreshed but not logged.
    pub fn load(sensor: Box<dyn BatterySensor>, store: Box<dyn SettingsStore>) -> Self {
        let (updates, _) = watch::channel(Snapshot::default());
        let mut sampler = Self {
            sensor,
            store,
            current: BatteryInfo::default(),
            history: HistoryLog::new(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            updates,
            active: true,
        };

        sampler.sensor.set_monitoring_enabled(true);
        sampler.current = sampler.read_sensor();

        if let Some(history) = persistence::load_history(&*sampler.store) {
            sampler.history = history;
        }
        if let Some(secs) = persistence::load_interval(&*sampler.store) {
            sampler.interval_secs = secs;
        }

        let evicted = sampler.history.retain_window(Utc::now());
        if evicted > 0 {
            debug!(evicted, "Dropped stale readings from stored history");
            persistence::save_history(&mut *sampler.store, &sampler.history);
        }

        info!(
            entries = sampler.history.len(),
            interval_secs = sampler.interval_secs,
            "Sampler loaded"
        );
        sampler.publish();
        sampler
    }

    /// Load, then log one reading unless `skip_initial_sample` is set.
    pub fn initialize(
        sensor: Box<dyn BatterySensor>,
        store: Box<dyn SettingsStore>,
        skip_initial_sample: bool,
    ) -> Self {
        let mut sampler = Self::load(sensor, store);
        if !skip_initial_sample {
            let _ = sampler.log_entry();
        }
        sampler
    }

    /// Take a reading now, append it, evict stale entries and persist.
    /// Fails with [`SamplerError::Stopped`] after shutdown, leaving history
    /// and store untouched.
    pub fn log_entry(&mut self) -> Result<BatteryReading, SamplerError> {
        self.log_entry_at(Utc::now())
    }

    pub(crate) fn log_entry_at(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<BatteryReading, SamplerError> {
        if !self.active {
            return Err(SamplerError::Stopped);
        }

        self.current = self.read_sensor();
        let reading = BatteryReading::from_info(now, self.current);

        self.history.push(reading.clone());
        let evicted = self.history.retain_window(now);
        persistence::save_history(&mut *self.store, &self.history);

        debug!(
            level = reading.level,
            state = %reading.state,
            entries = self.history.len(),
            evicted,
            "Logged battery reading"
        );
        self.publish();
        Ok(reading)
    }

    /// Validate and persist a new interval. Rescheduling is the caller's job.
    pub fn set_interval(&mut self, secs: u64) -> Result<(), SamplerError> {
        self.interval_secs = validate_interval(secs)?;
        persistence::save_interval(&mut *self.store, secs);
        info!(interval_secs = secs, "Sampling interval changed");
        self.publish();
        Ok(())
    }

    /// Interval currently persisted in the store, which another process may
    /// have changed.
    pub fn stored_interval(&self) -> Option<u64> {
        persistence::load_interval(&*self.store)
    }

    /// Disable battery monitoring. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.sensor.set_monitoring_enabled(false);
        debug!("Sampler shut down");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn current(&self) -> BatteryInfo {
        self.current
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            level: self.current.level,
            state: self.current.state,
            history: self.history.clone(),
            interval_secs: self.interval_secs,
        }
    }

    /// Receive a snapshot after every mutation. The receiver starts with the
    /// latest snapshot already marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    fn read_sensor(&mut self) -> BatteryInfo {
        match self.sensor.read() {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "Battery sensor unavailable, using default reading");
                BatteryInfo::default()
            }
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
