use crate::app::{
    Ctx, Input, KeyAction, Menu, Screen, ScreenError, Selection, Signal, handle_mapped,
    menu_activate, menu_down, menu_up,
};
use crate::screens::{GroupPicker, Halt, Help, InstalledPicker, ServerLaunch, Settings, ShellLaunch};
use crate::ui::{self, ListRow, theme};
use ratatui::Frame;
use std::time::Duration;

const HALT_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RootEntry {
    Install,
    Select,
    Run,
    Shell,
    Settings,
    Help,
    Halt,
    Exit,
}

impl RootEntry {
    pub const ALL: [Self; 8] = [
        Self::Install,
        Self::Select,
        Self::Run,
        Self::Shell,
        Self::Settings,
        Self::Help,
        Self::Halt,
        Self::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Install => "Install new version",
            Self::Select => "Select version",
            Self::Run => "Run",
            Self::Shell => "Shell",
            Self::Settings => "Settings",
            Self::Help => "Help",
            Self::Halt => "Halt 5s",
            Self::Exit => "Exit",
        }
    }
}

/// Bottom of the navigation stack.
#[derive(Debug, Default)]
pub struct RootMenu {
    selection: Selection,
}

impl RootMenu {
    const KEYS: &'static [(Input, KeyAction<Self>)] = &[
        (Input::Up, menu_up::<Self>),
        (Input::Down, menu_down::<Self>),
        (Input::Confirm, menu_activate::<Self>),
        (Input::Right, menu_activate::<Self>),
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> RootEntry {
        RootEntry::ALL[self.selection.index().min(RootEntry::ALL.len() - 1)]
    }

    fn open(entry: RootEntry, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        let screen: Box<dyn Screen> = match entry {
            RootEntry::Install => Box::new(GroupPicker::new()),
            RootEntry::Select => {
                ctx.status.reset();
                Box::new(InstalledPicker::open(&ctx.services.layout)?)
            }
            RootEntry::Run => Box::new(ServerLaunch),
            RootEntry::Shell => Box::new(ShellLaunch),
            RootEntry::Settings => Box::new(Settings::new(&ctx.services.config)),
            RootEntry::Help => Box::new(Help::new(ctx.services.config_path.clone())),
            RootEntry::Halt => Box::new(Halt::new(HALT_DELAY)),
            RootEntry::Exit => return Ok(Signal::Exit),
        };
        Ok(Signal::Push(screen))
    }
}

impl Menu for RootMenu {
    fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    fn entry_count(&self) -> usize {
        RootEntry::ALL.len()
    }

    fn activate(&mut self, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        Self::open(self.selected(), ctx)
    }
}

impl Screen for RootMenu {
    fn title(&self) -> &str {
        "root"
    }

    fn draw(&mut self, ctx: &mut Ctx<'_>) -> Result<Option<Signal>, ScreenError> {
        let version = match ctx.services.layout.active_artifact() {
            Some(artifact) => format!("Current server version: {artifact}"),
            None => "No server version selected yet".to_string(),
        };
        let rows: Vec<ListRow> = RootEntry::ALL
            .iter()
            .map(|entry| ListRow::new(entry.label()))
            .collect();
        let selected = self.selection.index();
        let status = &*ctx.status;

        ctx.console.render(&mut |frame: &mut Frame| {
            ui::render_line(
                frame,
                0,
                "Manage your Minecraft server (↑↓ to navigate, Enter/Right to select, q to quit):",
                theme::plain(),
            );
            ui::render_line(frame, 1, &version, theme::plain());
            ui::render_list(frame, ui::LIST_TOP_TALL, &rows, selected);
            ui::render_status(frame, status);
        })?;
        Ok(None)
    }

    fn handle_key(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        handle_mapped(self, Self::KEYS, input, ctx)
    }
}
