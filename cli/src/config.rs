use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::Level;
use voltlog_core::gauge::{DEFAULT_LOW_THRESHOLD, DEFAULT_REFRESH_MINS};
use voltlog_core::GaugePolicy;

const DATABASE_NAME: &str = "settings.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "off" => LogLevel::Off,
            "error" => LogLevel::Error,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Warn,
        }
    }

    pub fn as_tracing_level(&self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub log_level: LogLevel,
    /// Gauge flags levels below this fraction as low.
    pub low_battery_threshold: f32,
    pub gauge_refresh_mins: u32,
    /// Overrides the settings database location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            low_battery_threshold: DEFAULT_LOW_THRESHOLD,
            gauge_refresh_mins: DEFAULT_REFRESH_MINS as u32,
            database: None,
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("voltlog")
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("voltlog")
}

pub fn runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("voltlog")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub fn ensure_dirs() -> std::io::Result<()> {
    fs::create_dir_all(config_dir())?;
    fs::create_dir_all(data_dir())?;
    Ok(())
}

impl UserConfig {
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Malformed content falls back to defaults.
    pub fn parse(content: &str) -> Self {
        toml::from_str(content).unwrap_or_default()
    }

    pub fn save(&self) -> std::io::Result<()> {
        let _ = ensure_dirs();
        let path = config_path();
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        fs::write(path, content)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| data_dir().join(DATABASE_NAME))
    }

    pub fn gauge_policy(&self) -> GaugePolicy {
        GaugePolicy {
            low_threshold: self.low_battery_threshold,
            refresh: chrono::Duration::minutes(i64::from(self.gauge_refresh_mins.max(1))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = UserConfig::parse("log_level = \"debug\"\n");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.low_battery_threshold, DEFAULT_LOW_THRESHOLD);
        assert_eq!(config.gauge_refresh_mins, 10);
        assert!(config.database.is_none());
    }

    #[test]
    fn test_malformed_config_is_default() {
        let config = UserConfig::parse("log_level = [");
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_database_override() {
        let config = UserConfig::parse("database = \"/tmp/voltlog-test/settings.db\"\n");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/voltlog-test/settings.db")
        );
        assert!(UserConfig::default()
            .database_path()
            .ends_with("voltlog/settings.db"));
    }

    #[test]
    fn test_gauge_policy_from_config() {
        let config = UserConfig::parse("low_battery_threshold = 0.15\ngauge_refresh_mins = 0\n");
        let policy = config.gauge_policy();
        assert_eq!(policy.low_threshold, 0.15);
        assert_eq!(policy.refresh, chrono::Duration::minutes(1));
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("TRACE"), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("off"), LogLevel::Off);
        assert_eq!(LogLevel::from_str("bogus"), LogLevel::Warn);
        assert_eq!(LogLevel::Off.as_tracing_level(), None);
        assert_eq!(LogLevel::Info.as_tracing_level(), Some(Level::INFO));
    }
}
