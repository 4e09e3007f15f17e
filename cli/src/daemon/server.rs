use std::fs;
use std::path::PathBuf;

use tokio::signal::unix::{signal, SignalKind};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};
use voltlog_core::{Monitor, SqliteStore, StoreError};
use voltlog_platform::SystemBattery;

use crate::config::{runtime_dir, LogLevel, UserConfig};
use crate::daemon::{is_daemon_running, pid_path};
use crate::logging::{self, LogMode};

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings store error: {0}")]
    Store(#[from] StoreError),

    #[error("Already running")]
    AlreadyRunning,

    #[error("Failed to daemonize: {0}")]
    Daemonize(String),
}

pub type Result<T> = std::result::Result<T, DaemonError>;

pub fn run_daemon(
    foreground: bool,
    skip_initial_sample: bool,
    config: &UserConfig,
    log_level_override: Option<LogLevel>,
) -> Result<()> {
    if is_daemon_running() {
        return Err(DaemonError::AlreadyRunning);
    }

    let pid_file = pid_path();
    fs::create_dir_all(runtime_dir())?;

    if foreground {
        fs::write(&pid_file, std::process::id().to_string())?;
    } else {
        daemonize::Daemonize::new()
            .pid_file(&pid_file)
            .working_directory(runtime_dir())
            .start()
            .map_err(|e| DaemonError::Daemonize(e.to_string()))?;
        let guard = logging::init(config.log_level, LogMode::File, log_level_override);
        std::mem::forget(guard);
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Daemon starting");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(run_daemon_async(
        config.database_path(),
        skip_initial_sample,
    ));

    if let Err(e) = &result {
        error!(error = %e, "Daemon exited with error");
    }
    fs::remove_file(&pid_file).ok();
    result
}

async fn run_daemon_async(database: PathBuf, skip_initial_sample: bool) -> Result<()> {
    let store = SqliteStore::open(&database)?;
    info!(database = ?database, "Opened settings store");

    if !SystemBattery::is_available() {
        warn!("No battery detected, readings will fall back to defaults");
    }

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut user1 = signal(SignalKind::user_defined1())?;

    let monitor = Monitor::initialize(
        Box::new(SystemBattery::new()),
        Box::new(store),
        skip_initial_sample,
    );
    let mut updates = WatchStream::from_changes(monitor.subscribe());

    loop {
        tokio::select! {
            _ = interrupt.recv() => {
                info!("Interrupted");
                break;
            }
            _ = terminate.recv() => {
                info!("Shutdown requested");
                break;
            }
            _ = hangup.recv() => {
                match monitor.reload_interval() {
                    Ok(Some(secs)) => info!(interval_secs = secs, "Reloaded sampling interval"),
                    Ok(None) => debug!("Sampling interval unchanged"),
                    Err(e) => warn!(error = %e, "Failed to reload sampling interval"),
                }
            }
            _ = user1.recv() => {
                match monitor.log_entry() {
                    Ok(reading) => {
                        info!(level = reading.level, state = %reading.state, "Sampled on request")
                    }
                    Err(e) => warn!(error = %e, "Sample request ignored"),
                }
            }
            Some(snapshot) = updates.next() => {
                debug!(
                    level = snapshot.level,
                    state = %snapshot.state,
                    entries = snapshot.history.len(),
                    interval_secs = snapshot.interval_secs,
                    "State updated"
                );
            }
        }
    }

    monitor.shutdown();
    info!("Daemon shutting down");
    Ok(())
}
