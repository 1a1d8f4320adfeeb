/// Half-open `(min, max)` range of list indices visible around `selected` when
/// `visible_rows` lines are available.
///
/// The selection stays centred once it passes the first half page. `max` may
/// exceed the list length; callers clamp when slicing. Zero rows yields an
/// empty range.
pub fn window(selected: usize, visible_rows: usize) -> (usize, usize) {
    let half = visible_rows / 2;
    let min = selected.saturating_sub(half);
    let max = if selected <= half {
        visible_rows
    } else {
        selected + half
    };
    if visible_rows == 0 {
        return (min, min);
    }
    // With a single row `half` is zero and `max` would equal `selected`.
    (min, max.max(selected + 1))
}

/// Items inside the window, each paired with its index in the full list.
///
/// Position in the returned iterator is the screen row offset; the paired
/// index is what must be compared against the selection.
pub fn windowed<T>(
    items: &[T],
    selected: usize,
    visible_rows: usize,
) -> impl Iterator<Item = (usize, &T)> {
    let (min, max) = window(selected, visible_rows);
    items
        .iter()
        .enumerate()
        .skip(min)
        .take(max.saturating_sub(min))
}
