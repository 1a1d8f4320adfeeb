use crate::app::{
    Ctx, Input, KeyAction, LineEditor, Menu, Screen, ScreenError, Selection, Signal,
    handle_mapped, leave, menu_activate, menu_down, menu_up, window,
};
use crate::domain::{AppConfig, LaunchCommand, LaunchCommandError, MemoryConfig};
use crate::infra::{ConfigError, ServerLayout, save_config};
use crate::ui::{self, ListRow, theme};
use ratatui::Frame;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};
use unicode_width::UnicodeWidthStr;

const ROW_PREFIX: &str = "-> ";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Field {
    Path,
    MinMemory,
    MaxMemory,
    Gui,
    AdditionalArgs,
    JavaPath,
    Separator,
    Save,
    Cancel,
}

const FIELDS: [Field; 9] = [
    Field::Path,
    Field::MinMemory,
    Field::MaxMemory,
    Field::Gui,
    Field::AdditionalArgs,
    Field::JavaPath,
    Field::Separator,
    Field::Save,
    Field::Cancel,
];

impl Field {
    fn label(self) -> &'static str {
        match self {
            Self::Path => "Path",
            Self::MinMemory => "Min RAM (GB)",
            Self::MaxMemory => "Max RAM (GB)",
            Self::Gui => "GUI",
            Self::AdditionalArgs => "Additional args",
            Self::JavaPath => "Java path",
            Self::Separator => "",
            Self::Save => "[Save]",
            Self::Cancel => "[Cancel]",
        }
    }

    fn is_text(self) -> bool {
        matches!(
            self,
            Self::Path | Self::MinMemory | Self::MaxMemory | Self::AdditionalArgs | Self::JavaPath
        )
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("server path must not be empty")]
    EmptyPath,

    #[error("{field} must be a whole number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error(transparent)]
    Launch(#[from] LaunchCommandError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Editable copy of the config; numbers stay text until saved.
#[derive(Clone, Debug, Eq, PartialEq)]
struct Draft {
    path: String,
    min_memory: String,
    max_memory: String,
    gui: bool,
    additional_args: String,
    java_path: String,
}

impl Draft {
    fn from_config(config: &AppConfig) -> Self {
        Self {
            path: config.path.display().to_string(),
            min_memory: config.memory.min.to_string(),
            max_memory: config.memory.max.to_string(),
            gui: config.gui,
            additional_args: config.additional_args.join(" "),
            java_path: config.java_path.clone(),
        }
    }

    fn value(&self, field: Field) -> String {
        match field {
            Field::Path => self.path.clone(),
            Field::MinMemory => self.min_memory.clone(),
            Field::MaxMemory => self.max_memory.clone(),
            Field::Gui => self.gui.to_string(),
            Field::AdditionalArgs => self.additional_args.clone(),
            Field::JavaPath => self.java_path.clone(),
            Field::Separator | Field::Save | Field::Cancel => String::new(),
        }
    }

    fn set_text(&mut self, field: Field, text: String) {
        match field {
            Field::Path => self.path = text,
            Field::MinMemory => self.min_memory = text,
            Field::MaxMemory => self.max_memory = text,
            Field::AdditionalArgs => self.additional_args = text,
            Field::JavaPath => self.java_path = text,
            Field::Gui | Field::Separator | Field::Save | Field::Cancel => {}
        }
    }

    fn to_config(&self) -> Result<AppConfig, SettingsError> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(SettingsError::EmptyPath);
        }
        let path = PathBuf::from(path);
        let path = std::path::absolute(&path).unwrap_or(path);

        let config = AppConfig {
            path,
            java_path: self.java_path.trim().to_string(),
            memory: MemoryConfig {
                min: parse_gigabytes(Field::MinMemory, &self.min_memory)?,
                max: parse_gigabytes(Field::MaxMemory, &self.max_memory)?,
            },
            gui: self.gui,
            additional_args: self
                .additional_args
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        };
        LaunchCommand::for_server(&config)?;
        Ok(config)
    }
}

fn parse_gigabytes(field: Field, value: &str) -> Result<u32, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::NotANumber {
            field: field.label(),
            value: value.to_string(),
        })
}

/// Form over the manager config. While a field is being edited the screen
/// captures text, so the quit key types a `q`.
#[derive(Debug)]
pub struct Settings {
    draft: Draft,
    selection: Selection,
    editing: Option<LineEditor>,
}

impl Settings {
    const KEYS: &'static [(Input, KeyAction<Self>)] = &[
        (Input::Up, menu_up::<Self>),
        (Input::Down, menu_down::<Self>),
        (Input::Left, leave::<Self>),
        (Input::Confirm, menu_activate::<Self>),
        (Input::Right, menu_activate::<Self>),
        (Input::Char(' '), Self::toggle),
    ];

    pub fn new(config: &AppConfig) -> Self {
        Self {
            draft: Draft::from_config(config),
            selection: Selection::default(),
            editing: None,
        }
    }

    fn field(&self) -> Field {
        FIELDS[self.selection.index().min(FIELDS.len() - 1)]
    }

    fn toggle(&mut self, _ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        if self.field() == Field::Gui {
            self.draft.gui = !self.draft.gui;
        }
        Ok(Signal::Continue)
    }

    fn edit(&mut self, input: Input) -> Signal {
        match input {
            Input::Confirm => {
                if let Some(editor) = self.editing.take() {
                    let text = editor.into_text().trim().to_string();
                    self.draft.set_text(self.field(), text);
                }
            }
            Input::Cancel => self.editing = None,
            other => {
                if let Some(editor) = self.editing.as_mut() {
                    match other {
                        Input::Backspace => editor.backspace(),
                        Input::Left => editor.move_left(),
                        Input::Right => editor.move_right(),
                        _ => {
                            if let Some(ch) = other.as_text() {
                                editor.insert_char(ch);
                            }
                        }
                    }
                }
            }
        }
        Signal::Continue
    }

    fn save(&mut self, ctx: &mut Ctx<'_>) -> Signal {
        match self.persist(ctx) {
            Ok(()) => {
                ctx.status.set("Config saved successfully.");
                Signal::Back
            }
            Err(error) => {
                warn!(error = %error, "config not saved");
                ctx.status.set(format!("Error saving config: {error}"));
                Signal::ErrorBack
            }
        }
    }

    fn persist(&self, ctx: &mut Ctx<'_>) -> Result<(), SettingsError> {
        let config = self.draft.to_config()?;
        save_config(&ctx.services.config_path, &config)?;

        let layout = ServerLayout::new(config.path.clone());
        if let Err(error) = layout.ensure() {
            warn!(root = %layout.root().display(), error = %error, "could not prepare server directory");
        }
        info!(path = %ctx.services.config_path.display(), "config saved");
        ctx.services.layout = layout;
        ctx.services.config = config;
        Ok(())
    }

    fn rows(&self) -> Vec<ListRow> {
        FIELDS
            .iter()
            .enumerate()
            .map(|(index, field)| match field {
                Field::Separator => ListRow::blank(),
                Field::Save | Field::Cancel => ListRow::new(field.label()),
                _ => {
                    let value = match &self.editing {
                        Some(editor) if index == self.selection.index() => editor.text().to_string(),
                        _ => self.draft.value(*field),
                    };
                    ListRow::new(format!("{}: {value}", field.label()))
                }
            })
            .collect()
    }
}

impl Menu for Settings {
    fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    fn entry_count(&self) -> usize {
        FIELDS.len()
    }

    fn is_blank(&self, index: usize) -> bool {
        FIELDS.get(index) == Some(&Field::Separator)
    }

    fn activate(&mut self, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        let field = self.field();
        let signal = match field {
            Field::Save => self.save(ctx),
            Field::Cancel => Signal::Back,
            Field::Gui => {
                self.draft.gui = !self.draft.gui;
                Signal::Continue
            }
            Field::Separator => Signal::Continue,
            _ => {
                self.editing = Some(LineEditor::from_text(self.draft.value(field)));
                Signal::Continue
            }
        };
        Ok(signal)
    }
}

impl Screen for Settings {
    fn title(&self) -> &str {
        "settings"
    }

    fn draw(&mut self, ctx: &mut Ctx<'_>) -> Result<Option<Signal>, ScreenError> {
        let rows = self.rows();
        let selected = self.selection.index();
        let field = self.field();
        let cursor = self.editing.as_ref().filter(|_| field.is_text()).map(|editor| {
            let label = format!("{ROW_PREFIX}{}: ", field.label());
            label.width() + editor.cursor_width()
        });
        let status = &*ctx.status;

        ctx.console.render(&mut |frame: &mut Frame| {
            ui::render_line(
                frame,
                0,
                "Application settings (Enter to edit, Space to toggle, Left to go back)",
                theme::plain(),
            );
            if cursor.is_some() {
                ui::render_line(
                    frame,
                    1,
                    "You're now editing. Enter keeps the value, Esc discards it.",
                    theme::plain(),
                );
            }
            ui::render_list(frame, ui::LIST_TOP, &rows, selected);
            ui::render_status(frame, status);

            if let Some(column) = cursor {
                let (first, _) = window(selected, ui::visible_rows(frame.area()));
                let row = usize::from(ui::LIST_TOP) + selected.saturating_sub(first);
                if let (Ok(x), Ok(y)) = (u16::try_from(column), u16::try_from(row)) {
                    frame.set_cursor_position((x, y));
                }
            }
        })?;
        Ok(None)
    }

    fn handle_key(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        if self.editing.is_some() {
            return Ok(self.edit(input));
        }
        handle_mapped(self, Self::KEYS, input, ctx)
    }

    fn captures_text(&self) -> bool {
        self.editing.is_some()
    }
}
