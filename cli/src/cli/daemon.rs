use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum DaemonCommands {
    /// Start sampling in the background
    Start {
        /// Stay attached to the terminal
        #[arg(short, long)]
        foreground: bool,

        /// Don't take a reading at startup
        #[arg(long)]
        skip_initial_sample: bool,
    },

    /// Stop the running daemon
    Stop,

    /// Show whether the daemon is running
    Status,
}
