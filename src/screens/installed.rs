use crate::app::{
    Ctx, Input, KeyAction, Menu, Screen, ScreenError, Selection, Signal, handle_mapped, leave,
    menu_activate, menu_down, menu_up,
};
use crate::infra::ServerLayout;
use crate::ui::{self, ListRow, theme};
use ratatui::Frame;
use tracing::warn;

/// Downloaded artifacts; confirm makes the selected one active.
#[derive(Debug)]
pub struct InstalledPicker {
    installed: Vec<String>,
    active: Option<String>,
    selection: Selection,
}

impl InstalledPicker {
    const KEYS: &'static [(Input, KeyAction<Self>)] = &[
        (Input::Up, menu_up::<Self>),
        (Input::Down, menu_down::<Self>),
        (Input::Left, leave::<Self>),
        (Input::Confirm, menu_activate::<Self>),
        (Input::Right, menu_activate::<Self>),
    ];

    /// Fails when `bin/` cannot be listed; the screen is then never pushed.
    pub fn open(layout: &ServerLayout) -> Result<Self, ScreenError> {
        let installed = layout
            .list_installed()
            .map_err(|error| ScreenError::Setup(error.to_string()))?;
        Ok(Self {
            installed,
            active: layout.active_artifact(),
            selection: Selection::default(),
        })
    }
}

impl Menu for InstalledPicker {
    fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    fn entry_count(&self) -> usize {
        self.installed.len()
    }

    fn activate(&mut self, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        let Some(artifact) = self.installed.get(self.selection.index()) else {
            return Ok(Signal::Continue);
        };
        match ctx.services.layout.set_active(artifact) {
            Ok(message) => {
                ctx.status.set(message);
                self.active = Some(artifact.clone());
                Ok(Signal::Ok)
            }
            Err(error) => {
                warn!(artifact = %artifact, error = %error, "activation failed");
                ctx.status.set(error.to_string());
                Ok(Signal::ErrorBack)
            }
        }
    }
}

impl Screen for InstalledPicker {
    fn title(&self) -> &str {
        "installed versions"
    }

    fn draw(&mut self, ctx: &mut Ctx<'_>) -> Result<Option<Signal>, ScreenError> {
        let rows: Vec<ListRow> = self
            .installed
            .iter()
            .map(|name| ListRow::new(name.as_str()).active(self.active.as_ref() == Some(name)))
            .collect();
        let selected = self.selection.index();
        let status = &*ctx.status;

        ctx.console.render(&mut |frame: &mut Frame| {
            ui::render_line(
                frame,
                0,
                "Select the PaperMC version to run (* marks the active one)",
                theme::plain(),
            );
            if rows.is_empty() {
                ui::render_line(
                    frame,
                    ui::LIST_TOP,
                    "Nothing installed yet. Use \"Install new version\" first.",
                    theme::plain(),
                );
            } else {
                ui::render_list(frame, ui::LIST_TOP, &rows, selected);
            }
            ui::render_status(frame, status);
        })?;
        Ok(None)
    }

    fn handle_key(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        handle_mapped(self, Self::KEYS, input, ctx)
    }
}
