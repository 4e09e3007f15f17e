mod daemon;

pub use daemon::DaemonCommands;

use std::time::Duration;

use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run or control the background sampler
    Daemon {
        #[command(subcommand)]
        command: DaemonCommands,
    },

    /// Take a battery reading now
    Sample,

    /// Show the last 24 hours of readings, newest first
    #[command(alias = "log")]
    History {
        /// Print as JSON
        #[arg(long)]
        json: bool,

        /// Show at most this many readings
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show or set the sampling interval (e.g. 10m, 90s, 1h)
    Interval {
        #[arg(value_parser = humantime::parse_duration)]
        every: Option<Duration>,
    },

    /// Print the gauge timeline as JSON
    Gauge {
        /// Compact JSON output (one line)
        #[arg(short, long)]
        compact: bool,
    },

    /// Show or reset configuration
    Config {
        /// Print config file path
        #[arg(long)]
        path: bool,

        /// Reset config to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Debug, Parser)]
#[command(name = "voltlog", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the configured log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}
