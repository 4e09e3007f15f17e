mod cli;
mod commands;
mod config;
mod daemon;
mod logging;

use clap::Parser;
use color_eyre::eyre::Result;

use cli::{Cli, Commands};
use config::{ensure_dirs, LogLevel, UserConfig};
use logging::LogMode;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = ensure_dirs();

    let cli = Cli::parse();
    let config = UserConfig::load();
    let log_level_override = cli.log_level.as_deref().map(LogLevel::from_str);

    match cli.command {
        Commands::Daemon { command } => {
            commands::daemon::run(command, &config, log_level_override)
        }
        Commands::Sample => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::sample::run(&config)
        }
        Commands::History { json, limit } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::history::run(&config, json, limit)
        }
        Commands::Interval { every } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::interval::run(&config, every)
        }
        Commands::Gauge { compact } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::gauge::run(&config, compact)
        }
        Commands::Config { path, reset } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::config::run(path, reset)
        }
    }
}
