use crate::app::{Ctx, Input, Screen, ScreenError, Signal};
use crate::ui;
use ratatui::Frame;
use std::thread;
use std::time::Duration;

/// Blocks the interface for a fixed delay, then pops itself.
#[derive(Clone, Copy, Debug)]
pub struct Halt {
    delay: Duration,
}

impl Halt {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Screen for Halt {
    fn title(&self) -> &str {
        "halt"
    }

    fn should_clear(&self) -> bool {
        false
    }

    fn draw(&mut self, ctx: &mut Ctx<'_>) -> Result<Option<Signal>, ScreenError> {
        ctx.console
            .render(&mut |frame: &mut Frame| ui::render_bottom(frame, "Waiting..."))?;
        thread::sleep(self.delay);
        Ok(Some(Signal::Back))
    }

    fn handle_key(&mut self, _input: Input, _ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        Ok(Signal::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{ScriptedInput, TestServices, headless, screen_lines};
    use crate::app::{Flow, Runner};

    #[test]
    fn shows_waiting_and_pops_without_reading_input() {
        let fixture = TestServices::new();
        let mut services = fixture.build();
        let mut console = headless(40, 6);
        let mut runner = Runner::new(Box::new(Halt::new(Duration::ZERO)));

        let mut source = ScriptedInput::default();
        let flow = runner
            .tick(&mut console, &mut source, &mut services)
            .expect("tick");
        assert_eq!(flow, Flow::Exit);
        assert_eq!(screen_lines(&console)[5], "Waiting...");
    }
}
