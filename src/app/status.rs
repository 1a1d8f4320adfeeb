/// Outcome of the most recent action, shown at the bottom of the screen.
///
/// Owned by the runner and lent to the active screen for its turn only, so
/// there is exactly one writer at a time. Content is replaced, never appended.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatusLine {
    text: String,
}

impl StatusLine {
    pub fn get(&self) -> &str {
        &self.text
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn reset(&mut self) {
        self.text.clear();
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
