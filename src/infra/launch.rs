use crate::domain::LaunchCommand;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("failed to install Ctrl+C handler: {0}")]
    Handler(String),
}

/// Set by the Ctrl+C handler; consumed by whoever is blocked on an external
/// call when the interrupt arrived.
#[derive(Clone, Debug, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    /// Installs the process-wide handler. Raw mode turns Ctrl+C into a key
    /// event, so this only fires while the terminal is released to a child.
    pub fn install() -> Result<Self, LaunchError> {
        let flag = Self::default();
        let handle = flag.clone();
        ctrlc::set_handler(move || handle.raise())
            .map_err(|error| LaunchError::Handler(error.to_string()))?;
        Ok(flag)
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExitReport {
    pub code: Option<i32>,
    pub interrupted: bool,
}

impl ExitReport {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code_label(&self) -> String {
        self.code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "-1".to_string())
    }
}

/// Foreground process runner. Callers release the terminal before `run` and
/// restore it afterwards.
pub trait ProcessLauncher {
    fn run(
        &self,
        command: &LaunchCommand,
        cwd: &Path,
        interrupt: &InterruptFlag,
    ) -> Result<ExitReport, LaunchError>;

    /// Holds the released terminal until the user acknowledges `message`.
    fn pause(&self, message: &str);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn run(
        &self,
        command: &LaunchCommand,
        cwd: &Path,
        interrupt: &InterruptFlag,
    ) -> Result<ExitReport, LaunchError> {
        interrupt.take();
        info!(command = %command.display(), cwd = %cwd.display(), "launching foreground process");
        let status = Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .status()
            .map_err(|source| LaunchError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let report = ExitReport {
            code: status.code(),
            interrupted: interrupt.take(),
        };
        if report.interrupted {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "Keyboard Interrupt (CTRL+C)!");
        }
        if !report.success() {
            warn!(code = ?report.code, interrupted = report.interrupted, "foreground process exited");
        }
        Ok(report)
    }

    fn pause(&self, message: &str) {
        let mut out = io::stdout().lock();
        let _ = write!(out, "\n{message}");
        let _ = out.flush();
        drop(out);

        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }
}

pub fn default_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|shell| !shell.trim().is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string())
}
