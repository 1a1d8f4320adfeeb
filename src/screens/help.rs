use crate::app::{Ctx, Input, KeyAction, Screen, ScreenError, Signal, handle_mapped, leave};
use crate::ui::{self, theme};
use ratatui::Frame;
use std::path::{Path, PathBuf};

const KEY_HELP: [&str; 6] = [
    "[LEFT]  Go back to the previous menu",
    "[RIGHT] Open the selected entry",
    "[ENTER] Open the selected entry, or confirm an edit",
    "[UP]    Move the selection up",
    "[DOWN]  Move the selection down",
    "[Q]     Quit the manager",
];

#[derive(Debug)]
pub struct Help {
    config_path: PathBuf,
}

impl Help {
    const KEYS: &'static [(Input, KeyAction<Self>)] =
        &[(Input::Left, leave::<Self>), (Input::Cancel, leave::<Self>)];

    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    fn lines(&self) -> Vec<String> {
        let app_dir = self.config_path.parent().unwrap_or(Path::new("."));
        let mut lines = vec!["Keys:".to_string()];
        lines.extend(KEY_HELP.iter().map(|line| format!("  {line}")));
        lines.push(String::new());
        lines.push(format!("Config file: {}", self.config_path.display()));
        lines.push(format!("Open the app folder: cd {}", app_dir.display()));
        lines
    }
}

impl Screen for Help {
    fn title(&self) -> &str {
        "help"
    }

    fn draw(&mut self, ctx: &mut Ctx<'_>) -> Result<Option<Signal>, ScreenError> {
        let lines = self.lines();
        let status = &*ctx.status;
        ctx.console.render(&mut |frame: &mut Frame| {
            ui::render_line(frame, 0, "Help (Left to go back)", theme::plain());
            for (row, line) in (ui::LIST_TOP..).zip(&lines) {
                ui::render_line(frame, row, line, theme::plain());
            }
            ui::render_status(frame, status);
        })?;
        Ok(None)
    }

    fn handle_key(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        handle_mapped(self, Self::KEYS, input, ctx)
    }
}
