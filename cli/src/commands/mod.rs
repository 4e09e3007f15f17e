pub mod config;
pub mod daemon;
pub mod gauge;
pub mod history;
pub mod interval;
pub mod sample;

use color_eyre::eyre::{Result, WrapErr};
use voltlog_core::SqliteStore;

use crate::config::UserConfig;

pub(crate) fn open_store(config: &UserConfig) -> Result<SqliteStore> {
    let path = config.database_path();
    SqliteStore::open(&path)
        .wrap_err_with(|| format!("Failed to open settings database at {}", path.display()))
}
