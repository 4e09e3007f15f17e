//! Battery sensor access for voltlog.
//!
//! This crate provides the [`BatterySensor`] trait the sampler reads from,
//! the shared [`ChargeState`] type, and [`SystemBattery`], a sensor backed by
//! the operating system through `starship-battery`.
//!
//! # Example
//!
//! ```ignore
//! use voltlog_platform::{BatterySensor, SystemBattery};
//!
//! let mut battery = SystemBattery::new();
//! battery.set_monitoring_enabled(true);
//! let info = battery.read()?;
//! println!("Charge: {}%", info.percent());
//! ```

mod battery;
mod system;
mod types;

pub use battery::{clamp_level, BatteryInfo, BatterySensor};
pub use system::SystemBattery;
pub use types::ChargeState;
