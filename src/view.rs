use crate::error::ErrorKind;
use crate::models::HistoryItem;
use crate::selection::Selection;

/// What the main area shows. Derived from state on every change, never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum View<'a> {
    Upload,
    Loading,
    Error(ErrorKind),
    Single(&'a HistoryItem),
    /// Older entry first
    Comparison(&'a HistoryItem, &'a HistoryItem),
}

/// Pick the view for the current state. First matching rule wins.
pub fn select_view<'a>(
    history: &'a [HistoryItem],
    selection: &Selection,
    loading: bool,
    error: Option<ErrorKind>,
) -> View<'a> {
    if loading {
        return View::Loading;
    }
    if let Some(kind) = error {
        return View::Error(kind);
    }
    let items = selection.resolve(history);
    match items[..] {
        [] => View::Upload,
        [item] => View::Single(item),
        [older, newer, ..] => View::Comparison(older, newer),
    }
}
