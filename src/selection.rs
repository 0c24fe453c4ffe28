use crate::models::{HistoryId, HistoryItem};

pub const MAX_SELECTION: usize = 2;

/// Up to two history entries chosen for display, held by id in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<HistoryId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select exactly one entry, replacing whatever was selected.
    pub fn only(id: HistoryId) -> Self {
        Self { ids: vec![id] }
    }

    /// Deselect if selected, otherwise select when there is room.
    /// Returns whether the selection changed.
    pub fn toggle(&mut self, id: HistoryId) -> bool {
        if let Some(pos) = self.ids.iter().position(|&s| s == id) {
            self.ids.remove(pos);
            true
        } else if self.ids.len() < MAX_SELECTION {
            self.ids.push(id);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.ids.clear();
    }

    /// Drop ids no longer present in `history`.
    pub fn reset_on_clear(&mut self, history: &[HistoryItem]) {
        self.ids.retain(|id| history.iter().any(|item| item.id == *id));
    }

    pub fn contains(&self, id: HistoryId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= MAX_SELECTION
    }

    /// Ids in selection order.
    pub fn ids(&self) -> &[HistoryId] {
        &self.ids
    }

    /// Resolve the selected entries against `history`, oldest first.
    pub fn resolve<'a>(&self, history: &'a [HistoryItem]) -> Vec<&'a HistoryItem> {
        let mut items: Vec<&HistoryItem> = self
            .ids
            .iter()
            .filter_map(|id| history.iter().find(|item| item.id == *id))
            .collect();
        items.sort_by_key(|item| item.id);
        items
    }
}
