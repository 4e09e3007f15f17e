use color_eyre::eyre::{eyre, Result};
use starship_battery::units::ratio::percent;
use starship_battery::Manager;
use tracing::trace;

use crate::battery::{BatteryInfo, BatterySensor};
use crate::types::ChargeState;

/// Battery sensor backed by the operating system's power supply APIs.
///
/// A fresh [`Manager`] is created for every query. Sampling happens minutes
/// apart, and not holding OS handles keeps the sensor `Send`.
#[derive(Debug, Default)]
pub struct SystemBattery {
    monitoring: bool,
}

impl SystemBattery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a battery is available on this system.
    pub fn is_available() -> bool {
        Manager::new()
            .ok()
            .and_then(|m| m.batteries().ok())
            .and_then(|mut b| b.next())
            .and_then(|b| b.ok())
            .is_some()
    }
}

impl BatterySensor for SystemBattery {
    fn read(&mut self) -> Result<BatteryInfo> {
        if !self.monitoring {
            return Err(eyre!("Battery monitoring is disabled"));
        }

        let manager = Manager::new()?;
        let battery = manager
            .batteries()?
            .next()
            .ok_or_else(|| eyre!("No battery found"))??;

        let charge_percent = battery.state_of_charge().get::<percent>();
        let state = ChargeState::from(battery.state());
        trace!(charge_percent, state = %state, "Read system battery");

        Ok(BatteryInfo::new(charge_percent / 100.0, state))
    }

    fn set_monitoring_enabled(&mut self, enabled: bool) {
        self.monitoring = enabled;
    }

    fn is_monitoring_enabled(&self) -> bool {
        self.monitoring
    }
}
