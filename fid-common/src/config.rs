//! Configuration loading and data directory resolution
//!
//! Resolution priority order, highest first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default

use crate::{Error, Result};
use std::path::PathBuf;

/// Resolve the data directory holding the dispatch database
pub fn resolve_data_dir(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(dir) = config.get("data_dir").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(dir));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_data_dir())
}

/// Locate the configuration file for the platform
///
/// Linux checks the user config directory first, then /etc.
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        if let Some(path) = dirs::config_dir().map(|d| d.join("fid").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/fid/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("fid").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config("No config file found".to_string()))
        }
    }
}

/// Compiled default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("fid"))
        .unwrap_or_else(|| PathBuf::from("./fid-data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_wins() {
        let dir = resolve_data_dir(Some("/tmp/fid-test"), "FID_TEST_UNSET_VAR").unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/fid-test"));
    }

    #[test]
    fn test_env_var_used_when_no_cli_arg() {
        std::env::set_var("FID_TEST_DATA_DIR_A", "/tmp/fid-env");
        let dir = resolve_data_dir(None, "FID_TEST_DATA_DIR_A").unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/fid-env"));
        std::env::remove_var("FID_TEST_DATA_DIR_A");
    }

    #[test]
    fn test_fallback_produces_some_path() {
        let dir = resolve_data_dir(None, "FID_TEST_UNSET_VAR_B").unwrap();
        assert!(!dir.as_os_str().is_empty());
    }
}
