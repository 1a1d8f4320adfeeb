use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "server-mgr.log";
const LOG_ENV: &str = "SERVER_MGR_LOG";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    Open { path: String, source: io::Error },

    #[error("logger already initialized: {0}")]
    Init(String),
}

/// Routes `tracing` output to `<app_dir>/server-mgr.log`. The terminal is
/// owned by the UI, so nothing is ever written to stdout or stderr.
pub fn init_logging(app_dir: &Path) -> Result<(), LoggingError> {
    let path = app_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::Open {
            path: path.display().to_string(),
            source,
        })?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|error| LoggingError::Init(error.to_string()))
}
