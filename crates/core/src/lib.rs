//! Battery sampling, 24-hour retention and settings persistence for voltlog.
//!
//! [`Monitor`] samples a [`voltlog_platform::BatterySensor`] on a repeating
//! tokio timer, keeps the last 24 hours of readings, and writes history and
//! interval through to a [`SettingsStore`] after every change. Subscribers get
//! a [`Snapshot`] on each mutation.
//!
//! ```ignore
//! use voltlog_core::{Monitor, SqliteStore};
//! use voltlog_platform::SystemBattery;
//!
//! let store = SqliteStore::open(path)?;
//! let monitor = Monitor::initialize(Box::new(SystemBattery::new()), Box::new(store), false);
//! monitor.set_interval(300)?;
//! ```

pub mod gauge;
mod monitor;
pub mod persistence;
mod reading;
mod sampler;
mod store;

#[cfg(test)]
mod testing;

pub use gauge::{GaugeEntry, GaugePolicy, Timeline};
pub use monitor::Monitor;
pub use reading::{retention_cutoff, BatteryReading, HistoryLog, RETENTION_HOURS};
pub use sampler::{
    validate_interval, Sampler, SamplerError, Snapshot, DEFAULT_INTERVAL_SECS, MAX_INTERVAL_SECS,
};
pub use store::{MemoryStore, SettingsStore, SqliteStore, StoreError};
