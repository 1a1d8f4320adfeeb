use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;

/// Logical input events. Terminal key codes are translated once, here, so
/// screens never see backend-specific constants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Input {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Cancel,
    Backspace,
    /// The reserved `q` key.
    Quit,
    /// Ctrl+C. Ends the session even while a screen captures text.
    Interrupt,
    Char(char),
    /// Terminal resized; nothing to handle, but the screen must be redrawn.
    Redraw,
}

impl Input {
    /// Text carried by the event when a screen is capturing typed input.
    pub fn as_text(self) -> Option<char> {
        match self {
            Self::Quit => Some('q'),
            Self::Char(ch) => Some(ch),
            _ => None,
        }
    }

    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Self::Interrupt),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Up => Some(Self::Up),
            KeyCode::Down => Some(Self::Down),
            KeyCode::Left => Some(Self::Left),
            KeyCode::Right => Some(Self::Right),
            KeyCode::Enter => Some(Self::Confirm),
            KeyCode::Esc => Some(Self::Cancel),
            KeyCode::Backspace => Some(Self::Backspace),
            KeyCode::Char('q') => Some(Self::Quit),
            KeyCode::Char(ch) if !ch.is_control() => Some(Self::Char(ch)),
            _ => None,
        }
    }
}

/// Blocking source of one input event at a time.
pub trait InputSource {
    fn next_input(&mut self) -> io::Result<Input>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalInput;

impl InputSource for TerminalInput {
    fn next_input(&mut self) -> io::Result<Input> {
        loop {
            match event::read()? {
                Event::Key(key) => {
                    if let Some(input) = Input::from_key(key) {
                        return Ok(input);
                    }
                }
                Event::Resize(_, _) => return Ok(Input::Redraw),
                _ => {}
            }
        }
    }
}
