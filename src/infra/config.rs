use crate::domain::AppConfig;
use dirs::home_dir;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "config.json";
const CACHE_DIR: &str = "cache";

#[derive(Debug, Error)]
pub enum ResolveAppDirError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("config {path} is not valid: {message}")]
    Parse { path: String, message: String },

    #[error("failed to write config {path}: {source}")]
    Write { path: String, source: io::Error },
}

pub fn resolve_app_dir() -> Result<PathBuf, ResolveAppDirError> {
    if let Some(override_dir) = std::env::var_os("SERVER_MGR_HOME") {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(home) = home_dir() else {
        return Err(ResolveAppDirError::HomeDirNotFound);
    };

    Ok(home.join(".server_mgr"))
}

pub fn config_path(app_dir: &Path) -> PathBuf {
    app_dir.join(CONFIG_FILE)
}

pub fn cache_dir(app_dir: &Path) -> PathBuf {
    app_dir.join(CACHE_DIR)
}

pub fn load_config(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            });
        }
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|error| ConfigError::Parse {
            path: path.display().to_string(),
            message: error.to_string(),
        })
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let write_error = |source: io::Error| ConfigError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let text = serde_json::to_string_pretty(config).map_err(|error| ConfigError::Parse {
        path: path.display().to_string(),
        message: error.to_string(),
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text).map_err(write_error)?;
    fs::rename(&tmp, path).map_err(write_error)?;
    Ok(())
}
