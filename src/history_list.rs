use std::cmp::Ordering;

use clap::ValueEnum;

use crate::models::HistoryItem;
use crate::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortOrder {
    #[default]
    #[value(name = "newest")]
    NewestFirst,
    #[value(name = "oldest")]
    OldestFirst,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "Newest First",
            SortOrder::OldestFirst => "Oldest First",
            SortOrder::NameAsc => "Filename (A-Z)",
            SortOrder::NameDesc => "Filename (Z-A)",
        }
    }

    pub fn cycle(&self) -> SortOrder {
        match self {
            SortOrder::NewestFirst => SortOrder::OldestFirst,
            SortOrder::OldestFirst => SortOrder::NameAsc,
            SortOrder::NameAsc => SortOrder::NameDesc,
            SortOrder::NameDesc => SortOrder::NewestFirst,
        }
    }
}

/// Case-insensitive, falling back to the raw bytes so distinct names never tie.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Stable sort of `history` for display. Storage order is untouched.
pub fn sorted<'a>(history: &'a [HistoryItem], order: SortOrder) -> Vec<&'a HistoryItem> {
    let mut items: Vec<&HistoryItem> = history.iter().collect();
    match order {
        SortOrder::NewestFirst => items.sort_by(|a, b| b.id.cmp(&a.id)),
        SortOrder::OldestFirst => items.sort_by(|a, b| a.id.cmp(&b.id)),
        SortOrder::NameAsc => items.sort_by(|a, b| compare_names(&a.file_name, &b.file_name)),
        SortOrder::NameDesc => items.sort_by(|a, b| compare_names(&b.file_name, &a.file_name)),
    }
    items
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow<'a> {
    pub item: &'a HistoryItem,
    pub selected: bool,
    /// False for unselected rows once two entries are selected
    pub enabled: bool,
}

pub fn rows<'a>(
    history: &'a [HistoryItem],
    selection: &Selection,
    order: SortOrder,
) -> Vec<HistoryRow<'a>> {
    let full = selection.is_full();
    sorted(history, order)
        .into_iter()
        .map(|item| {
            let selected = selection.contains(item.id);
            HistoryRow {
                item,
                selected,
                enabled: selected || !full,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::sample_item;
    use crate::models::HistoryId;

    fn names(items: &[&HistoryItem]) -> Vec<String> {
        items.iter().map(|i| i.file_name.clone()).collect()
    }

    fn history() -> Vec<HistoryItem> {
        // storage order: newest first
        vec![
            sample_item(3, "beta.wav"),
            sample_item(2, "Alpha.wav"),
            sample_item(1, "gamma.wav"),
        ]
    }

    #[test]
    fn test_sort_by_time() {
        let h = history();
        assert_eq!(
            names(&sorted(&h, SortOrder::NewestFirst)),
            vec!["beta.wav", "Alpha.wav", "gamma.wav"]
        );
        assert_eq!(
            names(&sorted(&h, SortOrder::OldestFirst)),
            vec!["gamma.wav", "Alpha.wav", "beta.wav"]
        );
    }

    #[test]
    fn test_name_sorts_are_reverses() {
        let h = history();
        let asc = names(&sorted(&h, SortOrder::NameAsc));
        let mut desc = names(&sorted(&h, SortOrder::NameDesc));
        assert_eq!(asc, vec!["Alpha.wav", "beta.wav", "gamma.wav"]);
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_equal_names_keep_insertion_order() {
        let h = vec![
            sample_item(3, "same.wav"),
            sample_item(2, "other.wav"),
            sample_item(1, "same.wav"),
        ];
        for order in [SortOrder::NameAsc, SortOrder::NameDesc] {
            let ids: Vec<HistoryId> = sorted(&h, order)
                .iter()
                .filter(|i| i.file_name == "same.wav")
                .map(|i| i.id)
                .collect();
            assert_eq!(ids, vec![HistoryId(3), HistoryId(1)]);
        }
    }

    #[test]
    fn test_sort_leaves_storage_untouched() {
        let h = history();
        let _ = sorted(&h, SortOrder::NameAsc);
        assert_eq!(h[0].file_name, "beta.wav");
    }

    #[test]
    fn test_rows_disable_unselected_when_full() {
        let h = history();
        let mut sel = Selection::new();
        sel.toggle(HistoryId(1));
        let r = rows(&h, &sel, SortOrder::NewestFirst);
        assert!(r.iter().all(|row| row.enabled));

        sel.toggle(HistoryId(3));
        let r = rows(&h, &sel, SortOrder::NewestFirst);
        let flags: Vec<(bool, bool)> = r.iter().map(|row| (row.selected, row.enabled)).collect();
        assert_eq!(flags, vec![(true, true), (false, false), (true, true)]);
    }

    #[test]
    fn test_cycle_visits_every_order() {
        let mut order = SortOrder::default();
        let mut seen = vec![order];
        for _ in 0..3 {
            order = order.cycle();
            seen.push(order);
        }
        assert_eq!(order.cycle(), SortOrder::NewestFirst);
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_cli_names() {
        let names: Vec<String> = SortOrder::value_variants()
            .iter()
            .filter_map(|o| o.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["newest", "oldest", "name-asc", "name-desc"]);
        assert_eq!(SortOrder::from_str("name-desc", false), Ok(SortOrder::NameDesc));
        assert!(SortOrder::from_str("size", false).is_err());
    }
}
