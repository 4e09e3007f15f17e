use std::time::Duration;

use chrono::{Local, Utc};
use color_eyre::eyre::Result;
use voltlog_core::{persistence, BatteryReading, HistoryLog, DEFAULT_INTERVAL_SECS};

use crate::commands::open_store;
use crate::config::UserConfig;

pub fn run(config: &UserConfig, json: bool, limit: Option<usize>) -> Result<()> {
    let store = open_store(config)?;

    let mut history = persistence::load_history(&store).unwrap_or_default();
    history.retain_window(Utc::now());
    let readings = newest_first(&history, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&readings)?);
        return Ok(());
    }

    let interval = persistence::load_interval(&store).unwrap_or(DEFAULT_INTERVAL_SECS);
    println!(
        "Battery History ({} readings, every {})",
        history.len(),
        humantime::format_duration(Duration::from_secs(interval))
    );
    println!("{}", "=".repeat(40));

    if readings.is_empty() {
        println!("No battery history yet.");
        println!("\nStart the daemon to collect readings:");
        println!("  voltlog daemon start");
        return Ok(());
    }

    println!("{:<20} {:>5}  {}", "Time", "Level", "State");
    println!("{}", "-".repeat(40));
    for reading in readings {
        println!(
            "{:<20} {:>4}%  {}",
            reading
                .timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M"),
            reading.percent(),
            reading.state
        );
    }

    Ok(())
}

fn newest_first(history: &HistoryLog, limit: Option<usize>) -> Vec<&BatteryReading> {
    history
        .iter()
        .rev()
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}
