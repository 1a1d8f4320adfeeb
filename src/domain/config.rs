use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MemoryConfig {
    #[serde(default = "default_min_memory")]
    pub min: u32,
    #[serde(default = "default_max_memory")]
    pub max: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            min: default_min_memory(),
            max: default_max_memory(),
        }
    }
}

fn default_min_memory() -> u32 {
    1
}

fn default_max_memory() -> u32 {
    2
}

fn default_java_path() -> String {
    "java".to_string()
}

/// Persisted manager settings. Missing fields fall back to defaults so older
/// config files keep loading.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AppConfig {
    pub path: PathBuf,
    #[serde(default = "default_java_path")]
    pub java_path: String,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub gui: bool,
    #[serde(default)]
    pub additional_args: Vec<String>,
}

impl AppConfig {
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            java_path: default_java_path(),
            memory: MemoryConfig::default(),
            gui: false,
            additional_args: Vec::new(),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum LaunchCommandError {
    #[error("minimum memory must be at least 1 GB")]
    ZeroMemory,

    #[error("minimum memory ({min} GB) exceeds maximum memory ({max} GB)")]
    MemoryBounds { min: u32, max: u32 },

    #[error("java path is empty")]
    MissingJava,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchCommand {
    /// Command line for the active server, run from inside the active profile
    /// where `server.jar` resolves to the selected artifact.
    pub fn for_server(config: &AppConfig) -> Result<Self, LaunchCommandError> {
        let MemoryConfig { min, max } = config.memory;
        if min == 0 {
            return Err(LaunchCommandError::ZeroMemory);
        }
        if min > max {
            return Err(LaunchCommandError::MemoryBounds { min, max });
        }
        let program = config.java_path.trim();
        if program.is_empty() {
            return Err(LaunchCommandError::MissingJava);
        }

        let mut args = config.additional_args.clone();
        args.push(format!("-Xms{min}G"));
        args.push(format!("-Xmx{max}G"));
        args.push("-jar".to_string());
        args.push("./server.jar".to_string());
        if !config.gui {
            args.push("--nogui".to_string());
        }

        Ok(Self {
            program: program.to_string(),
            args,
        })
    }

    pub fn shell(program: String) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.join(" ")
    }
}
