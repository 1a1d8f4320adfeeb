use crate::app::{
    AppError, Console, Ctx, Input, InputSource, Screen, ScreenError, Services, Signal, StatusLine,
};
use tracing::{debug, info, warn};

struct Entry {
    screen: Box<dyn Screen>,
    initialized: bool,
}

/// Non-empty stack of screens. The bottom entry is the root menu and is never
/// popped; callers end the session instead.
pub struct NavigationStack {
    entries: Vec<Entry>,
}

impl NavigationStack {
    pub fn new(root: Box<dyn Screen>) -> Self {
        Self {
            entries: vec![Entry {
                screen: root,
                initialized: false,
            }],
        }
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, screen: Box<dyn Screen>) {
        debug!(screen = screen.title(), depth = self.entries.len() + 1, "push");
        self.entries.push(Entry {
            screen,
            initialized: false,
        });
    }

    /// Removes the top screen. Returns `None`, leaving the stack untouched,
    /// when only the root remains.
    pub fn pop(&mut self) -> Option<Box<dyn Screen>> {
        if self.entries.len() <= 1 {
            return None;
        }
        let entry = self.entries.pop()?;
        debug!(screen = entry.screen.title(), depth = self.entries.len(), "pop");
        Some(entry.screen)
    }

    pub fn return_to_root(&mut self) {
        self.entries.truncate(1);
        debug!("return to root");
    }

    pub fn titles(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|entry| entry.screen.title())
            .collect()
    }

    fn top_mut(&mut self) -> &mut Entry {
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Drives the draw/input loop over the navigation stack.
pub struct Runner {
    stack: NavigationStack,
    status: StatusLine,
}

impl Runner {
    pub fn new(root: Box<dyn Screen>) -> Self {
        Self {
            stack: NavigationStack::new(root),
            status: StatusLine::default(),
        }
    }

    #[cfg(test)]
    pub fn stack(&self) -> &NavigationStack {
        &self.stack
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn run(
        &mut self,
        console: &mut dyn Console,
        input: &mut dyn InputSource,
        services: &mut Services,
    ) -> Result<(), AppError> {
        info!(root = self.stack.titles().first().copied().unwrap_or(""), "session started");
        while self.tick(console, input, services)? == Flow::Continue {}
        info!(depth = self.stack.depth(), "session ended");
        Ok(())
    }

    /// One iteration: init if due, clear, draw, then read and dispatch a
    /// single input event unless the draw step already ended the screen.
    pub fn tick(
        &mut self,
        console: &mut dyn Console,
        input: &mut dyn InputSource,
        services: &mut Services,
    ) -> Result<Flow, AppError> {
        let entry = self.stack.top_mut();
        let mut ctx = Ctx {
            console,
            status: &mut self.status,
            services,
        };

        if entry.screen.should_init() && !entry.initialized {
            entry.initialized = true;
            match entry.screen.init(&mut ctx) {
                Ok(()) => {}
                Err(ScreenError::Setup(message)) => {
                    warn!(screen = entry.screen.title(), %message, "screen init failed");
                    ctx.status.set(message);
                    return Ok(self.pop_one());
                }
                Err(error) => return Err(error.into()),
            }
        }

        if entry.screen.should_clear() {
            ctx.console.clear()?;
        }

        match entry.screen.draw(&mut ctx) {
            Ok(Some(Signal::Ok | Signal::Back | Signal::ErrorBack)) => return Ok(self.pop_one()),
            Ok(Some(other)) => {
                debug!(screen = entry.screen.title(), signal = ?other, "draw signal ignored")
            }
            Ok(None) => {}
            Err(ScreenError::Setup(message)) => {
                warn!(screen = entry.screen.title(), %message, "screen draw failed");
                ctx.status.set(message);
                return Ok(self.pop_one());
            }
            Err(error) => return Err(error.into()),
        }

        let input = input.next_input()?;
        if input == Input::Redraw {
            return Ok(Flow::Continue);
        }

        let signal = match route_input(entry.screen.as_mut(), input, &mut ctx) {
            Ok(signal) => signal,
            Err(ScreenError::Setup(message)) => {
                warn!(screen = entry.screen.title(), %message, "action refused");
                ctx.status.set(message);
                Signal::Continue
            }
            Err(error) => return Err(error.into()),
        };
        Ok(self.apply(signal))
    }

    fn apply(&mut self, signal: Signal) -> Flow {
        match signal {
            Signal::ReturnToRoot => {
                self.stack.return_to_root();
                Flow::Continue
            }
            Signal::Exit => Flow::Exit,
            Signal::Back => self.pop_one(),
            Signal::Push(screen) => {
                self.stack.push(screen);
                Flow::Continue
            }
            Signal::Continue | Signal::Ok | Signal::ErrorBack => Flow::Continue,
        }
    }

    fn pop_one(&mut self) -> Flow {
        match self.stack.pop() {
            Some(_) => Flow::Continue,
            None => Flow::Exit,
        }
    }
}

/// Ctrl+C always exits. The reserved quit key wins over any key table unless
/// the screen is collecting text.
fn route_input(
    screen: &mut dyn Screen,
    input: Input,
    ctx: &mut Ctx<'_>,
) -> Result<Signal, ScreenError> {
    let quit = match input {
        Input::Interrupt => true,
        Input::Quit => !screen.captures_text(),
        _ => false,
    };
    if quit {
        return Ok(Signal::Exit);
    }
    screen.handle_key(input, ctx)
}
