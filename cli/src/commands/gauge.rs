use chrono::Utc;
use color_eyre::eyre::Result;
use voltlog_core::gauge;
use voltlog_platform::SystemBattery;

use crate::config::UserConfig;

pub fn run(config: &UserConfig, compact: bool) -> Result<()> {
    let mut sensor = SystemBattery::new();
    let timeline = gauge::timeline(&mut sensor, Utc::now(), config.gauge_policy());

    if compact {
        println!("{}", serde_json::to_string(&timeline)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
    }

    Ok(())
}
