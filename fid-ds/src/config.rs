//! Dispatch service configuration

use crate::cache::CacheSettings;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration assembled in `main` from CLI, environment and the
/// shared config-file resolution
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub port: u16,
    /// Directory holding the dispatch database
    pub data_dir: PathBuf,
    /// Internal deadline on search storage fetches
    pub search_fetch_timeout: Duration,
    /// Result cache tuning
    pub cache: CacheSettings,
}

impl Config {
    pub fn new(port: u16, data_dir: PathBuf) -> Self {
        Self {
            port,
            data_dir,
            search_fetch_timeout: Duration::from_secs(30),
            cache: CacheSettings::default(),
        }
    }

    /// Path of the SQLite database inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("dispatch.db")
    }
}
