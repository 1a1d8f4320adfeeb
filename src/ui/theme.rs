use ratatui::style::{Color, Modifier, Style};

// Terminal-default background; only the cursor row and the active build get color.
pub const FG: Color = Color::Reset;
pub const MUTED: Color = Color::Rgb(156, 163, 175);

pub const ACCENT: Color = Color::Rgb(255, 159, 26);
pub const SUCCESS: Color = Color::Rgb(134, 239, 172); // active artifact

pub fn plain() -> Style {
    Style::default().fg(FG)
}

pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn active() -> Style {
    Style::default().fg(SUCCESS)
}

pub fn status() -> Style {
    Style::default().fg(MUTED)
}
