//! Shared types for battery monitoring.

use std::fmt;

/// Battery charging state.
///
/// The integer codes returned by [`ChargeState::code`] are stable and used in
/// persisted history, so they must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargeState {
    /// State cannot be determined
    #[default]
    Unknown,
    /// Running on battery power
    Unplugged,
    /// Battery is actively charging
    Charging,
    /// External power connected and the battery is full
    Full,
}

impl ChargeState {
    /// Returns a human-readable label for the charge state.
    pub fn label(&self) -> &'static str {
        match self {
            ChargeState::Unknown => "Unknown",
            ChargeState::Unplugged => "Unplugged",
            ChargeState::Charging => "Charging",
            ChargeState::Full => "Full",
        }
    }

    /// Stable integer code used for storage.
    pub fn code(&self) -> i32 {
        match self {
            ChargeState::Unknown => 0,
            ChargeState::Unplugged => 1,
            ChargeState::Charging => 2,
            ChargeState::Full => 3,
        }
    }

    /// Decode a stored integer code. Unrecognised codes map to `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ChargeState::Unplugged,
            2 => ChargeState::Charging,
            3 => ChargeState::Full,
            _ => ChargeState::Unknown,
        }
    }

    /// Returns true if the battery is currently charging.
    pub fn is_charging(&self) -> bool {
        matches!(self, ChargeState::Charging)
    }

    /// Returns true if external power is connected.
    pub fn is_plugged_in(&self) -> bool {
        matches!(self, ChargeState::Charging | ChargeState::Full)
    }
}

impl fmt::Display for ChargeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<starship_battery::State> for ChargeState {
    fn from(state: starship_battery::State) -> Self {
        match state {
            starship_battery::State::Charging => ChargeState::Charging,
            starship_battery::State::Discharging => ChargeState::Unplugged,
            starship_battery::State::Empty => ChargeState::Unplugged,
            starship_battery::State::Full => ChargeState::Full,
            starship_battery::State::Unknown => ChargeState::Unknown,
        }
    }
}
