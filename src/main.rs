mod app;
mod cli;
mod domain;
mod infra;
mod screens;
mod ui;

use crate::app::{Runner, Services, TerminalInput, Tui};
use crate::cli::CliInvocation;
use crate::domain::AppConfig;
use crate::infra::{
    ConfigError, InterruptFlag, LaunchError, PaperClient, ResolveAppDirError, ServerLayout,
    SystemLauncher, cache_dir, config_path, init_logging, load_config, resolve_app_dir,
    save_config,
};
use crate::screens::RootMenu;
use crossterm::ExecutableCommand;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, BufRead, Stdout, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] crate::app::AppError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),

    #[error(transparent)]
    AppDir(#[from] ResolveAppDirError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("failed to prepare {path}: {source}")]
    Prepare { path: String, source: io::Error },

    #[error("no server directory given")]
    NoServerDir,
}

/// Everything resolved before the first screen is drawn.
struct Session {
    config: AppConfig,
    config_path: PathBuf,
    layout: ServerLayout,
    cache_dir: PathBuf,
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Tui { server_dir } => {
            let session = bootstrap(server_dir)?;
            run_tui(session)
        }
        CliInvocation::Command {
            server_dir,
            command,
        } => {
            let session = bootstrap(server_dir)?;
            let releases = PaperClient::new(session.cache_dir);
            crate::cli::run(command, &session.layout, &releases)?;
            Ok(())
        }
    }
}

fn print_help() {
    let text = format!(
        "{name} - manage a local PaperMC server\n\nUSAGE:\n  {name} [--server-dir PATH]              Start the TUI\n  {name} installed                        List downloaded server jars (* marks the active one)\n  {name} use <file>                       Make a downloaded jar the active server\n  {name} versions [--refresh]             Print version groups and their versions\n  {name} --help | --version\n\nFLAGS:\n  --server-dir PATH  Server directory to use on first run (default: prompt)\n  --refresh          Ignore the cached version list\n\nENV:\n  SERVER_MGR_HOME  Override the app directory (default: ~/.server_mgr)\n  SERVER_MGR_API   Override the release API base URL\n  SERVER_MGR_LOG   Log filter written to server-mgr.log (default: info)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}

fn bootstrap(server_dir: Option<PathBuf>) -> Result<Session, MainError> {
    let app_dir = resolve_app_dir()?;
    std::fs::create_dir_all(&app_dir).map_err(|source| MainError::Prepare {
        path: app_dir.display().to_string(),
        source,
    })?;

    if let Err(error) = init_logging(&app_dir) {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "logging disabled: {error}");
    }

    let config_path = config_path(&app_dir);
    let config = match load_config(&config_path)? {
        Some(config) => config,
        None => {
            let root = match server_dir {
                Some(dir) => dir,
                None => prompt_server_dir()?,
            };
            let config = AppConfig::with_path(absolute(&root));
            save_config(&config_path, &config)?;
            info!(path = %config_path.display(), "created initial config");
            config
        }
    };

    let layout = ServerLayout::new(config.path.clone());
    layout.ensure().map_err(|source| MainError::Prepare {
        path: layout.root().display().to_string(),
        source,
    })?;

    Ok(Session {
        config,
        config_path,
        layout,
        cache_dir: cache_dir(&app_dir),
    })
}

fn prompt_server_dir() -> Result<PathBuf, MainError> {
    let mut out = io::stdout().lock();
    let _ = write!(out, "Please type your designated server directory\n-> ");
    let _ = out.flush();

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|source| MainError::Prepare {
            path: "stdin".to_string(),
            source,
        })?;
    let line = line.trim();
    if line.is_empty() {
        return Err(MainError::NoServerDir);
    }
    Ok(PathBuf::from(line))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn run_tui(session: Session) -> Result<(), MainError> {
    let interrupt = InterruptFlag::install()?;
    let mut services = Services {
        config: session.config,
        config_path: session.config_path,
        layout: session.layout,
        releases: Box::new(PaperClient::new(session.cache_dir)),
        launcher: Box::new(SystemLauncher),
        interrupt,
    };

    let terminal = setup_terminal()?;
    let mut tui = Tui::attached(terminal);
    let mut runner = Runner::new(Box::new(RootMenu::new()));
    let result = runner.run(&mut tui, &mut TerminalInput, &mut services);
    if !runner.status().is_blank() {
        info!(status = runner.status().get(), "last status");
    }
    if let Err(error) = restore_terminal(tui.terminal_mut()) {
        warn!(error = %error, "terminal restore failed");
    }
    Ok(result?)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, app::AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;
    Ok(terminal)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), app::AppError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
