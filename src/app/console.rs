use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::Backend;
use ratatui::{Frame, Terminal};
use std::io;
use tracing::debug;

/// What a screen may do with the terminal during its turn.
pub trait Console {
    fn render(&mut self, paint: &mut dyn FnMut(&mut Frame)) -> io::Result<()>;

    fn clear(&mut self) -> io::Result<()>;

    /// Hands the real terminal to an external program (cooked mode, main
    /// screen, visible cursor).
    fn release(&mut self) -> io::Result<()>;

    /// Takes the terminal back after `release`.
    fn restore(&mut self) -> io::Result<()>;
}

pub struct Tui<B: Backend> {
    terminal: Terminal<B>,
    owns_tty: bool,
    released: bool,
}

impl<B: Backend> Tui<B> {
    /// Wraps a terminal already switched to raw mode and the alternate screen.
    pub fn attached(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            owns_tty: true,
            released: false,
        }
    }

    /// A terminal that never touches the process tty; release and restore
    /// only track state.
    #[cfg(test)]
    pub fn headless(backend: B) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
            owns_tty: false,
            released: false,
        })
    }

    #[cfg(test)]
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    #[cfg(test)]
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl<B: Backend> Console for Tui<B> {
    fn render(&mut self, paint: &mut dyn FnMut(&mut Frame)) -> io::Result<()> {
        self.terminal.draw(|frame| paint(frame))?;
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.terminal.clear()
    }

    fn release(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        if self.owns_tty {
            disable_raw_mode()?;
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.terminal.show_cursor()?;
        }
        self.released = true;
        debug!("terminal released");
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.released {
            return Ok(());
        }
        if self.owns_tty {
            enable_raw_mode()?;
            execute!(io::stdout(), EnterAlternateScreen)?;
            self.terminal.hide_cursor()?;
            self.terminal.clear()?;
        }
        self.released = false;
        debug!("terminal restored");
        Ok(())
    }
}

/// Scoped release of the terminal. The terminal is restored when the guard
/// drops, on every exit path including unwinding.
pub struct ExternalMode<'a> {
    console: &'a mut dyn Console,
}

impl<'a> ExternalMode<'a> {
    pub fn enter(console: &'a mut dyn Console) -> io::Result<Self> {
        console.release()?;
        Ok(Self { console })
    }
}

impl Drop for ExternalMode<'_> {
    fn drop(&mut self) {
        let _ = self.console.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::text::Line;

    #[test]
    fn external_mode_restores_on_every_exit_path() {
        let mut tui = Tui::headless(TestBackend::new(20, 4)).expect("tui");

        {
            let _external = ExternalMode::enter(&mut tui).expect("enter");
        }
        assert!(!tui.is_released());

        let result = (|| -> Result<(), &'static str> {
            let _external = ExternalMode::enter(&mut tui).map_err(|_| "enter")?;
            Err("external call failed")
        })();
        assert!(result.is_err());
        assert!(!tui.is_released());
    }

    #[test]
    fn render_paints_through_to_backend() {
        let mut tui = Tui::headless(TestBackend::new(10, 2)).expect("tui");
        tui.render(&mut |frame| frame.render_widget(Line::from("hello"), frame.area()))
            .expect("render");
        let buffer = tui.terminal().backend().buffer();
        assert_eq!(buffer[(0, 0)].symbol(), "h");
        assert_eq!(buffer[(4, 0)].symbol(), "o");
    }
}
