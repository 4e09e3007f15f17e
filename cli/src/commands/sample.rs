use color_eyre::eyre::Result;
use voltlog_core::Sampler;
use voltlog_platform::SystemBattery;

use crate::commands::open_store;
use crate::config::UserConfig;
use crate::daemon::{self, DaemonSignal};

pub fn run(config: &UserConfig) -> Result<()> {
    // A running daemon owns the history in memory; a local write would be
    // overwritten on its next save.
    if daemon::notify(DaemonSignal::Sample)? {
        println!("Asked the running daemon to take a reading.");
        return Ok(());
    }

    let store = open_store(config)?;
    let mut sampler = Sampler::initialize(Box::new(SystemBattery::new()), Box::new(store), true);
    let reading = sampler.log_entry()?;

    println!(
        "{}  {:>3}%  {}",
        reading.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
        reading.percent(),
        reading.state
    );
    println!("{} readings in the last 24 hours.", sampler.history().len());

    Ok(())
}
