pub mod theme;

use crate::app::{StatusLine, windowed};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Rows kept free of list content: header lines above the list and the
/// status line below it.
pub const RESERVED_LINES: u16 = 5;

/// First row of list content for screens with a one-line header.
pub const LIST_TOP: u16 = 2;

/// First row of list content for screens with a two-line header.
pub const LIST_TOP_TALL: u16 = 3;

pub fn visible_rows(area: Rect) -> usize {
    usize::from(area.height.saturating_sub(RESERVED_LINES))
}

/// Draws `text` on a single row, clipped to the frame. Rows past the bottom
/// are skipped.
pub fn render_line(frame: &mut Frame, row: u16, text: &str, style: Style) {
    let area = frame.area();
    if row >= area.height || area.width == 0 {
        return;
    }
    let line_area = Rect {
        x: area.x,
        y: area.y.saturating_add(row),
        width: area.width,
        height: 1,
    };
    frame.render_widget(Paragraph::new(text.to_string()).style(style), line_area);
}

pub fn render_status(frame: &mut Frame, status: &StatusLine) {
    render_bottom(frame, status.get());
}

/// Writes `text` on the last row, where the status line lives.
pub fn render_bottom(frame: &mut Frame, text: &str) {
    let height = frame.area().height;
    if height == 0 {
        return;
    }
    render_line(frame, height - 1, text, theme::status());
}

/// One entry of a selectable list.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListRow {
    pub label: String,
    pub active: bool,
    /// Separator row: drawn empty and never highlighted.
    pub blank: bool,
}

impl ListRow {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            active: false,
            blank: false,
        }
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn blank() -> Self {
        Self {
            blank: true,
            ..Self::default()
        }
    }
}

/// Renders the slice of `rows` visible around `selected`, starting at `top`.
///
/// Each row is placed by its position in the window but highlighted by its
/// index in the full list.
pub fn render_list(frame: &mut Frame, top: u16, rows: &[ListRow], selected: usize) {
    let visible = visible_rows(frame.area());
    for (offset, (index, row)) in windowed(rows, selected, visible).enumerate() {
        let Ok(offset) = u16::try_from(offset) else {
            break;
        };
        if row.blank {
            continue;
        }
        let style = if index == selected {
            theme::selected()
        } else if row.active {
            theme::active()
        } else {
            theme::plain()
        };
        let marker = if row.active { " *" } else { "" };
        render_line(
            frame,
            top.saturating_add(offset),
            &format!("-> {}{marker}", row.label),
            style,
        );
    }
}
