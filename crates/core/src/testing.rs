use std::sync::{Arc, Mutex};

use color_eyre::eyre::{eyre, Result};
use voltlog_platform::{BatteryInfo, BatterySensor, ChargeState};

#[derive(Debug)]
struct FakeState {
    info: Option<BatteryInfo>,
    monitoring: bool,
    reads: usize,
}

/// Scriptable sensor. Clones share state so a test can keep a handle after
/// moving the sensor into a sampler.
#[derive(Debug, Clone)]
pub struct FakeSensor {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSensor {
    pub fn new(level: f32, state: ChargeState) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                info: Some(BatteryInfo::new(level, state)),
                monitoring: false,
                reads: 0,
            })),
        }
    }

    /// A sensor whose every read fails.
    pub fn unavailable() -> Self {
        let sensor = Self::new(0.0, ChargeState::Unknown);
        sensor.state.lock().unwrap().info = None;
        sensor
    }

    pub fn set(&self, level: f32, state: ChargeState) {
        self.state.lock().unwrap().info = Some(BatteryInfo::new(level, state));
    }

    pub fn monitoring(&self) -> bool {
        self.state.lock().unwrap().monitoring
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }
}

impl BatterySensor for FakeSensor {
    fn read(&mut self) -> Result<BatteryInfo> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        state.info.ok_or_else(|| eyre!("sensor unavailable"))
    }

    fn set_monitoring_enabled(&mut self, enabled: bool) {
        self.state.lock().unwrap().monitoring = enabled;
    }

    fn is_monitoring_enabled(&self) -> bool {
        self.state.lock().unwrap().monitoring
    }
}
