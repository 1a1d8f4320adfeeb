mod console;
mod input;
mod line_editor;
mod menu;
mod nav;
mod status;
#[cfg(test)]
pub(crate) mod test_support;
mod window;

use crate::domain::AppConfig;
use crate::infra::{InterruptFlag, ProcessLauncher, ReleaseSource, ServerLayout};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use console::{Console, ExternalMode, Tui};
pub use input::{Input, InputSource, TerminalInput};
pub use line_editor::LineEditor;
pub use menu::{Menu, Selection, leave, menu_activate, menu_down, menu_up};
#[cfg(test)]
pub use nav::Flow;
pub use nav::Runner;
pub use status::StatusLine;
pub use window::{window, windowed};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Screen(#[from] ScreenError),
}

/// Failure raised by a screen at its boundary.
///
/// Action failures a screen anticipates never reach this type; the screen
/// turns them into `Signal::ErrorBack` with a status message.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// A precondition for building or initialising a screen is not met.
    #[error("{0}")]
    Setup(String),

    #[error("terminal I/O error: {0}")]
    Fatal(#[from] io::Error),
}

/// Outcome of one draw or input step, interpreted by the runner.
pub enum Signal {
    Continue,
    Ok,
    Back,
    ErrorBack,
    ReturnToRoot,
    Exit,
    Push(Box<dyn Screen>),
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("Continue"),
            Self::Ok => f.write_str("Ok"),
            Self::Back => f.write_str("Back"),
            Self::ErrorBack => f.write_str("ErrorBack"),
            Self::ReturnToRoot => f.write_str("ReturnToRoot"),
            Self::Exit => f.write_str("Exit"),
            Self::Push(screen) => f.debug_tuple("Push").field(&screen.title()).finish(),
        }
    }
}

/// External collaborators and session configuration shared by all screens.
pub struct Services {
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub layout: ServerLayout,
    pub releases: Box<dyn ReleaseSource>,
    pub launcher: Box<dyn ProcessLauncher>,
    pub interrupt: InterruptFlag,
}

/// Everything a screen may touch during its turn.
pub struct Ctx<'a> {
    pub console: &'a mut dyn Console,
    pub status: &'a mut StatusLine,
    pub services: &'a mut Services,
}

pub trait Screen {
    fn title(&self) -> &str;

    /// Whether the terminal is wiped before each draw.
    fn should_clear(&self) -> bool {
        true
    }

    /// Whether `init` must run once before the first draw.
    fn should_init(&self) -> bool {
        false
    }

    fn init(&mut self, _ctx: &mut Ctx<'_>) -> Result<(), ScreenError> {
        Ok(())
    }

    /// Renders the screen. Returning `Ok`, `Back` or `ErrorBack` pops it
    /// without waiting for a key.
    fn draw(&mut self, ctx: &mut Ctx<'_>) -> Result<Option<Signal>, ScreenError>;

    /// Never sees `Input::Interrupt`, nor `Input::Quit` unless `captures_text`
    /// is set.
    fn handle_key(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError>;

    /// True while the screen is collecting typed text; the reserved quit key
    /// is then delivered as the character `q`.
    fn captures_text(&self) -> bool {
        false
    }
}

pub type KeyAction<S> = fn(&mut S, &mut Ctx<'_>) -> Result<Signal, ScreenError>;

/// Looks `input` up in a screen's key table. Unmapped keys do nothing.
pub fn handle_mapped<S>(
    screen: &mut S,
    bindings: &[(Input, KeyAction<S>)],
    input: Input,
    ctx: &mut Ctx<'_>,
) -> Result<Signal, ScreenError> {
    match bindings.iter().find(|(key, _)| *key == input) {
        Some((_, action)) => action(screen, ctx),
        None => Ok(Signal::Continue),
    }
}
