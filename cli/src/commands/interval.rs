use std::time::Duration;

use color_eyre::eyre::Result;
use voltlog_core::{persistence, validate_interval, DEFAULT_INTERVAL_SECS};

use crate::commands::open_store;
use crate::config::UserConfig;
use crate::daemon::{self, DaemonSignal};

pub fn run(config: &UserConfig, every: Option<Duration>) -> Result<()> {
    let mut store = open_store(config)?;

    let Some(every) = every else {
        let secs = persistence::load_interval(&store).unwrap_or(DEFAULT_INTERVAL_SECS);
        println!(
            "Sampling every {}",
            humantime::format_duration(Duration::from_secs(secs))
        );
        return Ok(());
    };

    let secs = validate_interval(every.as_secs())?;
    persistence::try_save_interval(&mut store, secs)?;
    println!(
        "Sampling interval set to {}",
        humantime::format_duration(Duration::from_secs(secs))
    );

    if daemon::notify(DaemonSignal::ReloadInterval)? {
        println!("Running daemon rescheduled.");
    }

    Ok(())
}
