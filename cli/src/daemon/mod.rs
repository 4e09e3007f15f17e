mod server;

pub use server::run_daemon;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::runtime_dir;

const PID_FILE_NAME: &str = "voltlog.pid";

/// Signals the daemon understands besides SIGINT/SIGTERM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonSignal {
    /// Reload the interval from the settings store and reschedule.
    ReloadInterval,
    /// Take a reading now.
    Sample,
    /// Tear down and exit.
    Stop,
}

impl DaemonSignal {
    fn as_raw(self) -> libc::c_int {
        match self {
            DaemonSignal::ReloadInterval => libc::SIGHUP,
            DaemonSignal::Sample => libc::SIGUSR1,
            DaemonSignal::Stop => libc::SIGTERM,
        }
    }
}

pub fn pid_path() -> PathBuf {
    runtime_dir().join(PID_FILE_NAME)
}

fn read_pid(path: &Path) -> Option<libc::pid_t> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn process_alive(pid: libc::pid_t) -> bool {
    pid > 0 && unsafe { libc::kill(pid, 0) } == 0
}

/// Pid of the running daemon, if any. A pid file left behind by a dead
/// process counts as not running.
pub fn running_pid() -> Option<libc::pid_t> {
    read_pid(&pid_path()).filter(|pid| process_alive(*pid))
}

pub fn is_daemon_running() -> bool {
    running_pid().is_some()
}

pub fn send_signal(pid: libc::pid_t, signal: DaemonSignal) -> io::Result<()> {
    if unsafe { libc::kill(pid, signal.as_raw()) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Send `signal` to the running daemon. Returns false when none is running.
pub fn notify(signal: DaemonSignal) -> io::Result<bool> {
    match running_pid() {
        Some(pid) => send_signal(pid, signal).map(|()| true),
        None => Ok(false),
    }
}
