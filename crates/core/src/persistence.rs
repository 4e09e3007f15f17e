//! Best-effort persistence of history and interval.
//!
//! The `try_*` functions report every failure. The public wrappers log and
//! discard them: a failed write leaves the in-memory state authoritative, and
//! a failed read is treated as "nothing stored".

use tracing::{debug, warn};

use crate::reading::HistoryLog;
use crate::sampler::MAX_INTERVAL_SECS;
use crate::store::{SettingsStore, StoreError};

pub const HISTORY_KEY: &str = "batteryHistory";
pub const INTERVAL_KEY: &str = "logInterval";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Decoding error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid interval: {0}")]
    InvalidInterval(f64),
}

pub fn try_save_history(
    store: &mut dyn SettingsStore,
    history: &HistoryLog,
) -> Result<(), PersistError> {
    let bytes = serde_json::to_vec(history).map_err(PersistError::Encode)?;
    store.set(HISTORY_KEY, &bytes)?;
    Ok(())
}

/// `Ok(None)` when nothing is stored.
pub fn try_load_history(store: &dyn SettingsStore) -> Result<Option<HistoryLog>, PersistError> {
    let Some(bytes) = store.get(HISTORY_KEY)? else {
        return Ok(None);
    };
    let readings = serde_json::from_slice(&bytes).map_err(PersistError::Decode)?;
    Ok(Some(HistoryLog::from_readings(readings)))
}

pub fn try_save_interval(store: &mut dyn SettingsStore, secs: u64) -> Result<(), PersistError> {
    store.set_number(INTERVAL_KEY, secs as f64)?;
    Ok(())
}

/// `Ok(None)` when nothing is stored. Stored values outside
/// `1..=MAX_INTERVAL_SECS` (including NaN and infinities) are errors.
pub fn try_load_interval(store: &dyn SettingsStore) -> Result<Option<u64>, PersistError> {
    let Some(value) = store.get_number(INTERVAL_KEY)? else {
        return Ok(None);
    };
    if !value.is_finite() || value < 1.0 || value > MAX_INTERVAL_SECS as f64 {
        return Err(PersistError::InvalidInterval(value));
    }
    Ok(Some(value.round() as u64))
}

pub fn save_history(store: &mut dyn SettingsStore, history: &HistoryLog) {
    match try_save_history(store, history) {
        Ok(()) => debug!(entries = history.len(), "Saved history"),
        Err(e) => warn!(error = %e, "Failed to save history"),
    }
}

pub fn load_history(store: &dyn SettingsStore) -> Option<HistoryLog> {
    match try_load_history(store) {
        Ok(history) => history,
        Err(e) => {
            warn!(error = %e, "Discarding unreadable history");
            None
        }
    }
}

pub fn save_interval(store: &mut dyn SettingsStore, secs: u64) {
    match try_save_interval(store, secs) {
        Ok(()) => debug!(interval_secs = secs, "Saved interval"),
        Err(e) => warn!(error = %e, "Failed to save interval"),
    }
}

pub fn load_interval(store: &dyn SettingsStore) -> Option<u64> {
    match try_load_interval(store) {
        Ok(secs) => secs,
        Err(e) => {
            warn!(error = %e, "Ignoring stored interval");
            None
        }
    }
}
