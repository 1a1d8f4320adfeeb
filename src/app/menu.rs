use crate::app::{Ctx, ScreenError, Signal};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Up,
    Down,
}

/// Cursor over a list that may contain blank separator rows.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Selection {
    index: usize,
}

impl Selection {
    pub fn index(self) -> usize {
        self.index
    }

    /// Moves one selectable row in `direction`, stepping over blanks.
    ///
    /// Stays put when nothing selectable lies that way. The scan is bounded by
    /// the list length, so an all-blank list cannot loop.
    pub fn step(&mut self, direction: Direction, blanks: &[bool]) {
        let len = blanks.len();
        if len == 0 {
            self.index = 0;
            return;
        }

        let start = self.index.min(len - 1);
        let mut candidate = start;
        for _ in 0..len {
            let next = match direction {
                Direction::Up => candidate.checked_sub(1),
                Direction::Down => (candidate + 1 < len).then_some(candidate + 1),
            };
            let Some(next) = next else {
                break;
            };
            candidate = next;
            if !blanks[candidate] {
                self.index = candidate;
                return;
            }
        }
        self.index = start;
    }

    /// Keeps the cursor inside a list that may have shrunk.
    pub fn clamp(&mut self, len: usize) {
        self.index = self.index.min(len.saturating_sub(1));
    }
}

/// Shared behaviour of list-driven screens: bounded cursor movement and an
/// `activate` step invoked on the confirm keys.
pub trait Menu {
    fn selection_mut(&mut self) -> &mut Selection;

    fn entry_count(&self) -> usize;

    fn is_blank(&self, _index: usize) -> bool {
        false
    }

    /// Returns a child screen to push or a terminal signal.
    fn activate(&mut self, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError>;

    fn move_up(&mut self) -> Signal {
        self.move_selection(Direction::Up)
    }

    fn move_down(&mut self) -> Signal {
        self.move_selection(Direction::Down)
    }

    fn move_selection(&mut self, direction: Direction) -> Signal {
        let blanks: Vec<bool> = (0..self.entry_count())
            .map(|index| self.is_blank(index))
            .collect();
        self.selection_mut().step(direction, &blanks);
        Signal::Continue
    }
}

pub fn menu_up<M: Menu>(menu: &mut M, _ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
    Ok(menu.move_up())
}

pub fn menu_down<M: Menu>(menu: &mut M, _ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
    Ok(menu.move_down())
}

pub fn menu_activate<M: Menu>(menu: &mut M, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
    menu.activate(ctx)
}

pub fn leave<S>(_screen: &mut S, _ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
    Ok(Signal::Back)
}
