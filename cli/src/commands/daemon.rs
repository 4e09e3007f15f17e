use std::time::Duration;

use color_eyre::eyre::Result;

use crate::cli::DaemonCommands;
use crate::config::{LogLevel, UserConfig};
use crate::daemon::{
    is_daemon_running, pid_path, run_daemon, running_pid, send_signal, DaemonSignal,
};
use crate::logging::{self, log_dir, LogMode};

pub fn run(
    command: DaemonCommands,
    config: &UserConfig,
    log_level_override: Option<LogLevel>,
) -> Result<()> {
    match command {
        DaemonCommands::Start {
            foreground,
            skip_initial_sample,
        } => {
            if is_daemon_running() {
                println!("Daemon is already running.");
                return Ok(());
            }

            if foreground {
                let _guard = logging::init(config.log_level, LogMode::Both, log_level_override);
                println!("Starting daemon in foreground...");
                println!("Press Ctrl+C to stop.");
                run_daemon(true, skip_initial_sample, config, log_level_override)?;
            } else {
                println!("Starting daemon...");
                println!("Logs: {}", log_dir().display());
                run_daemon(false, skip_initial_sample, config, log_level_override)?;
            }
        }
        DaemonCommands::Stop => {
            let Some(pid) = running_pid() else {
                println!("Daemon is not running.");
                return Ok(());
            };

            send_signal(pid, DaemonSignal::Stop)?;

            let mut stopped = false;
            for _ in 0..10 {
                std::thread::sleep(Duration::from_millis(200));
                if !is_daemon_running() {
                    stopped = true;
                    break;
                }
            }

            if stopped {
                println!("Daemon stopped.");
            } else {
                println!("Sent stop signal to pid {}, but it is still running.", pid);
            }
        }
        DaemonCommands::Status => {
            println!("Daemon Status");
            println!("{}", "-".repeat(40));
            match running_pid() {
                Some(pid) => {
                    println!("Running:      yes");
                    println!("PID:          {}", pid);
                }
                None => println!("Running:      no"),
            }
            println!("PID file:     {}", pid_path().display());
            println!("Database:     {}", config.database_path().display());
        }
    }

    Ok(())
}
