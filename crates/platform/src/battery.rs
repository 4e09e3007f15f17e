//! Battery sensor trait and snapshot type.

use color_eyre::eyre::Result;

use crate::types::ChargeState;

/// Battery information snapshot.
///
/// Level and state are always captured by the same sensor query, so the two
/// fields never describe different moments.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BatteryInfo {
    /// Current charge level as a fraction (0.0-1.0).
    pub level: f32,

    /// Current charging state.
    pub state: ChargeState,
}

impl BatteryInfo {
    pub fn new(level: f32, state: ChargeState) -> Self {
        Self {
            level: clamp_level(level),
            state,
        }
    }

    /// Charge level as a whole percentage (0-100).
    pub fn percent(&self) -> u8 {
        (self.level * 100.0).round() as u8
    }
}

/// Clamp a raw level into `[0.0, 1.0]`. NaN becomes 0.0.
pub fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// A source of battery readings.
pub trait BatterySensor: Send {
    /// Query the battery. Level and state come from one query.
    fn read(&mut self) -> Result<BatteryInfo>;

    /// Turn battery monitoring on or off.
    fn set_monitoring_enabled(&mut self, enabled: bool);

    fn is_monitoring_enabled(&self) -> bool;
}

impl<T: BatterySensor + ?Sized> BatterySensor for Box<T> {
    fn read(&mut self) -> Result<BatteryInfo> {
        (**self).read()
    }

    fn set_monitoring_enabled(&mut self, enabled: bool) {
        (**self).set_monitoring_enabled(enabled)
    }

    fn is_monitoring_enabled(&self) -> bool {
        (**self).is_monitoring_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_is_clamped() {
        assert_eq!(BatteryInfo::new(1.4, ChargeState::Full).level, 1.0);
        assert_eq!(BatteryInfo::new(-0.2, ChargeState::Unplugged).level, 0.0);
        assert_eq!(BatteryInfo::new(f32::NAN, ChargeState::Unknown).level, 0.0);
    }

    #[test]
    fn test_percent_rounds() {
        assert_eq!(BatteryInfo::new(0.806, ChargeState::Charging).percent(), 81);
        assert_eq!(BatteryInfo::new(0.0, ChargeState::Unplugged).percent(), 0);
        assert_eq!(BatteryInfo::new(1.0, ChargeState::Full).percent(), 100);
    }

    #[test]
    fn test_default_is_safe_reading() {
        let info = BatteryInfo::default();
        assert_eq!(info.level, 0.0);
        assert_eq!(info.state, ChargeState::Unknown);
    }
}
