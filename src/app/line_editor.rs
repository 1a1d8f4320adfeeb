use unicode_width::UnicodeWidthStr;

/// Single-line text buffer with a character cursor, used while a settings
/// field is being edited.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LineEditor {
    text: String,
    cursor_col: usize,
}

impl LineEditor {
    /// Starts with the cursor after the last character.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor_col = text.chars().count();
        Self { text, cursor_col }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch.is_control() {
            return;
        }
        let byte_index = char_to_byte_index(&self.text, self.cursor_col);
        self.text.insert(byte_index, ch);
        self.cursor_col += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor_col == 0 {
            return;
        }
        self.cursor_col -= 1;
        let byte_index = char_to_byte_index(&self.text, self.cursor_col);
        self.text.remove(byte_index);
    }

    pub fn move_left(&mut self) {
        self.cursor_col = self.cursor_col.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor_col = (self.cursor_col + 1).min(self.text.chars().count());
    }

    /// Terminal columns occupied by the text left of the cursor.
    pub fn cursor_width(&self) -> usize {
        let byte_index = char_to_byte_index(&self.text, self.cursor_col);
        self.text[..byte_index].width()
    }
}

fn char_to_byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}
