use crate::infra::{CatalogError, LayoutError, ReleaseSource, ServerLayout};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui {
        server_dir: Option<PathBuf>,
    },
    Command {
        server_dir: Option<PathBuf>,
        command: CliCommand,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    Installed,
    Use { artifact: String },
    Versions { refresh: bool },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut iter = args.iter().skip(1).peekable();
    let mut server_dir: Option<PathBuf> = None;
    while let Some(arg) = iter.peek() {
        match arg.as_str() {
            "--server-dir" | "-d" => {
                let _ = iter.next();
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--server-dir".to_string()))?;
                server_dir = Some(PathBuf::from(value));
            }
            "--" => {
                let _ = iter.next();
                break;
            }
            flag if flag.starts_with('-') => {
                return Err(CliParseError::UnknownFlag(flag.to_string()));
            }
            _ => break,
        }
    }

    let Some(subcommand) = iter.next() else {
        return Ok(CliInvocation::Tui { server_dir });
    };

    let command = match subcommand.as_str() {
        "installed" => {
            if let Some(arg) = iter.next() {
                return Err(unexpected(arg));
            }
            CliCommand::Installed
        }
        "use" => {
            let artifact = iter
                .next()
                .ok_or_else(|| CliParseError::MissingArgument("<file>".to_string()))?;
            if let Some(arg) = iter.next() {
                return Err(unexpected(arg));
            }
            CliCommand::Use {
                artifact: artifact.to_string(),
            }
        }
        "versions" => {
            let mut refresh = false;
            for arg in iter {
                match arg.as_str() {
                    "--refresh" | "-r" => refresh = true,
                    other => return Err(unexpected(other)),
                }
            }
            CliCommand::Versions { refresh }
        }
        other => return Err(CliParseError::UnknownSubcommand(other.to_string())),
    };

    Ok(CliInvocation::Command {
        server_dir,
        command,
    })
}

fn unexpected(arg: &str) -> CliParseError {
    if arg.starts_with('-') {
        CliParseError::UnknownFlag(arg.to_string())
    } else {
        CliParseError::UnexpectedArgument(arg.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub fn run(
    command: CliCommand,
    layout: &ServerLayout,
    releases: &dyn ReleaseSource,
) -> Result<(), CliRunError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    run_to(command, layout, releases, &mut out)?;
    out.flush()?;
    Ok(())
}

fn run_to(
    command: CliCommand,
    layout: &ServerLayout,
    releases: &dyn ReleaseSource,
    out: &mut impl Write,
) -> Result<(), CliRunError> {
    match command {
        CliCommand::Installed => {
            let active = layout.active_artifact();
            for artifact in layout.list_installed()? {
                let marker = if active.as_deref() == Some(artifact.as_str()) {
                    "\t*"
                } else {
                    ""
                };
                if !write_line(out, &format!("{artifact}{marker}"))? {
                    return Ok(());
                }
            }
            Ok(())
        }
        CliCommand::Use { artifact } => {
            let message = layout.set_active(&artifact)?;
            write_line(out, &message)?;
            Ok(())
        }
        CliCommand::Versions { refresh } => {
            let catalog = releases.catalog(refresh)?;
            for group in &catalog.version_groups {
                let versions = catalog.versions_in(group).join(" ");
                if !write_line(out, &format!("{group}\t{versions}"))? {
                    return Ok(());
                }
            }
            Ok(())
        }
    }
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}
