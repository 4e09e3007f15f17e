//! Recurring sampling on a tokio timer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace};
use voltlog_platform::{BatteryInfo, BatterySensor};

use crate::reading::BatteryReading;
use crate::sampler::{Sampler, SamplerError, Snapshot};
use crate::store::SettingsStore;

struct Shared {
    sampler: Mutex<Sampler>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    fn sampler(&self) -> MutexGuard<'_, Sampler> {
        self.sampler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ticker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A [`Sampler`] driven by a repeating timer.
///
/// Timer firings, manual samples and reconfiguration all go through one
/// mutex, so each append-evict-persist step completes before the next
/// begins. Must be created inside a tokio runtime.
pub struct Monitor {
    shared: Arc<Shared>,
}

impl Monitor {
    pub fn initialize(
        sensor: Box<dyn BatterySensor>,
        store: Box<dyn SettingsStore>,
        skip_initial_sample: bool,
    ) -> Self {
        let sampler = Sampler::initialize(sensor, store, skip_initial_sample);
        let interval_secs = sampler.interval_secs();

        let shared = Arc::new(Shared {
            sampler: Mutex::new(sampler),
            ticker: Mutex::new(None),
        });
        *shared.ticker() = Some(spawn_ticker(&shared, interval_secs));

        info!(interval_secs, "Monitor started");
        Self { shared }
    }

    /// Take a reading now. Does not move the timer.
    pub fn log_entry(&self) -> Result<BatteryReading, SamplerError> {
        self.shared.sampler().log_entry()
    }

    /// Persist a new interval and restart the timer so the next sample lands
    /// `secs` seconds from now. A zero interval is rejected and the running
    /// schedule is left alone.
    pub fn set_interval(&self, secs: u64) -> Result<(), SamplerError> {
        let mut ticker = self.shared.ticker();
        {
            let mut sampler = self.shared.sampler();
            if !sampler.is_active() {
                return Err(SamplerError::Stopped);
            }
            sampler.set_interval(secs)?;
        }

        if let Some(handle) = ticker.take() {
            handle.abort();
        }
        *ticker = Some(spawn_ticker(&self.shared, secs));
        Ok(())
    }

    /// Pick up an interval another process wrote to the store. Returns the
    /// new interval when it changed.
    pub fn reload_interval(&self) -> Result<Option<u64>, SamplerError> {
        let (stored, current) = {
            let sampler = self.shared.sampler();
            (sampler.stored_interval(), sampler.interval_secs())
        };

        match stored {
            Some(secs) if secs != current => {
                self.set_interval(secs)?;
                Ok(Some(secs))
            }
            _ => Ok(None),
        }
    }

    /// Stop the timer and disable battery monitoring. Idempotent; also runs
    /// on drop.
    pub fn shutdown(&self) {
        if let Some(handle) = self.shared.ticker().take() {
            handle.abort();
            debug!("Sampling timer cancelled");
        }
        self.shared.sampler().shutdown();
    }

    pub fn is_active(&self) -> bool {
        self.shared.sampler().is_active()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.sampler().snapshot()
    }

    pub fn current(&self) -> BatteryInfo {
        self.shared.sampler().current()
    }

    pub fn interval_secs(&self) -> u64 {
        self.shared.sampler().interval_secs()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.sampler().subscribe()
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_ticker(shared: &Arc<Shared>, secs: u64) -> JoinHandle<()> {
    let weak: Weak<Shared> = Arc::downgrade(shared);
    let period = Duration::from_secs(secs);
    let first = Instant::now() + period;

    tokio::spawn(async move {
        let mut tick = tokio::time::interval_at(first, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick.tick().await;
            let Some(shared) = weak.upgrade() else {
                break;
            };
            trace!("Scheduled sample");
            if shared.sampler().log_entry().is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence;
    use crate::store::MemoryStore;
    use crate::testing::FakeSensor;
    use voltlog_platform::ChargeState;

    fn start(sensor: &FakeSensor, store: &MemoryStore, skip: bool) -> Monitor {
        Monitor::initialize(Box::new(sensor.clone()), Box::new(store.clone()), skip)
    }

    fn entries(monitor: &Monitor) -> usize {
        monitor.snapshot().history.len()
    }

    async fn advance_secs(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_on_default_interval() {
        let sensor = FakeSensor::new(0.9, ChargeState::Unplugged);
        let store = MemoryStore::new();
        let monitor = start(&sensor, &store, false);
        assert_eq!(entries(&monitor), 1);

        advance_secs(599).await;
        assert_eq!(entries(&monitor), 1);

        advance_secs(2).await;
        assert_eq!(entries(&monitor), 2);

        advance_secs(600).await;
        assert_eq!(entries(&monitor), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_interval_restarts_from_now() {
        let sensor = FakeSensor::new(0.9, ChargeState::Unplugged);
        let store = MemoryStore::new();
        let monitor = start(&sensor, &store, true);

        advance_secs(300).await;
        monitor.set_interval(100).unwrap();

        advance_secs(99).await;
        assert_eq!(entries(&monitor), 0);

        advance_secs(2).await;
        assert_eq!(entries(&monitor), 1);

        // The old 600s schedule (t=600) must not fire on top of the new one.
        advance_secs(200).await;
        assert_eq!(entries(&monitor), 3);

        assert_eq!(persistence::load_interval(&store), Some(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_keeps_cadence() {
        let sensor = FakeSensor::new(0.9, ChargeState::Unplugged);
        let store = MemoryStore::new();
        let monitor = start(&sensor, &store, true);

        advance_secs(300).await;
        assert_eq!(
            monitor.set_interval(0),
            Err(SamplerError::InvalidInterval(0))
        );
        assert_eq!(monitor.interval_secs(), 600);

        advance_secs(299).await;
        assert_eq!(entries(&monitor), 0);

        advance_secs(2).await;
        assert_eq!(entries(&monitor), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_samples_after_shutdown() {
        let sensor = FakeSensor::new(0.9, ChargeState::Unplugged);
        let store = MemoryStore::new();
        let monitor = start(&sensor, &store, true);
        assert!(sensor.monitoring());

        monitor.shutdown();
        monitor.shutdown();
        assert!(!sensor.monitoring());
        assert!(!monitor.is_active());

        advance_secs(3600).await;
        assert_eq!(entries(&monitor), 0);
        assert_eq!(monitor.set_interval(60), Err(SamplerError::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_entry_after_shutdown_is_rejected() {
        let sensor = FakeSensor::new(0.9, ChargeState::Unplugged);
        let store = MemoryStore::new();
        let monitor = start(&sensor, &store, true);
        monitor.shutdown();

        assert_eq!(monitor.log_entry(), Err(SamplerError::Stopped));
        assert_eq!(entries(&monitor), 0);
        assert_eq!(persistence::load_history(&store), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_tears_down() {
        let sensor = FakeSensor::new(0.9, ChargeState::Unplugged);
        let store = MemoryStore::new();
        let monitor = start(&sensor, &store, true);
        drop(monitor);
        assert!(!sensor.monitoring());

        let reads = sensor.reads();
        advance_secs(3600).await;
        assert_eq!(sensor.reads(), reads);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_sample_does_not_move_timer() {
        let sensor = FakeSensor::new(0.9, ChargeState::Unplugged);
        let store = MemoryStore::new();
        let monitor = start(&sensor, &store, true);

        advance_secs(100).await;
        monitor.log_entry().unwrap();
        assert_eq!(entries(&monitor), 1);

        advance_secs(501).await;
        assert_eq!(entries(&monitor), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_interval_from_store() {
        let sensor = FakeSensor::new(0.9, ChargeState::Unplugged);
        let store = MemoryStore::new();
        let monitor = start(&sensor, &store, true);

        assert_eq!(monitor.reload_interval(), Ok(None));

        let mut other = store.clone();
        persistence::save_interval(&mut other, 30);
        assert_eq!(monitor.reload_interval(), Ok(Some(30)));
        assert_eq!(monitor.interval_secs(), 30);

        advance_secs(31).await;
        assert_eq!(entries(&monitor), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_receives_scheduled_samples() {
        let sensor = FakeSensor::new(0.9, ChargeState::Unplugged);
        let store = MemoryStore::new();
        let monitor = start(&sensor, &store, true);
        let mut rx = monitor.subscribe();

        sensor.set(0.55, ChargeState::Charging);
        rx.changed().await.unwrap();

        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.level, 0.55);
        assert_eq!(snapshot.state, ChargeState::Charging);
    }
}
