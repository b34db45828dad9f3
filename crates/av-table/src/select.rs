//! Row selection state
//!
//! Selection is stored compactly: a distinguished "select all" flag plus
//! the set of exceptions to it, so selecting every row of a large table
//! never enumerates the indices.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Selection state for one table with `row_count` capacity.
///
/// When `select_all` is set the exceptions are the deselected rows;
/// otherwise they are the selected rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectInfo {
    pub select_all: bool,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exceptions: BTreeSet<usize>,
    pub row_count: usize,
}

impl SelectInfo {
    pub fn new(row_count: usize) -> Self {
        Self {
            row_count,
            ..Default::default()
        }
    }

    /// Select every row.
    pub fn select_all(&mut self) {
        self.select_all = true;
        self.exceptions.clear();
    }

    /// Deselect every row.
    pub fn deselect_all(&mut self) {
        self.select_all = false;
        self.exceptions.clear();
    }

    /// Select or deselect a single row.  Out-of-capacity indices are
    /// ignored.
    pub fn set_row_select(&mut self, row_idx: usize, selected: bool) {
        if row_idx >= self.row_count {
            return;
        }
        if selected == self.select_all {
            self.exceptions.remove(&row_idx);
        } else {
            self.exceptions.insert(row_idx);
        }
    }

    pub fn is_selected(&self, row_idx: usize) -> bool {
        if row_idx >= self.row_count {
            return false;
        }
        self.select_all != self.exceptions.contains(&row_idx)
    }

    /// True when every row is selected.
    pub fn is_select_all(&self) -> bool {
        self.select_all && self.exceptions.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        if self.select_all {
            self.row_count - self.exceptions.len()
        } else {
            self.exceptions.len()
        }
    }

    /// Selected row indices in ascending order.
    pub fn selected(&self) -> Vec<usize> {
        if self.select_all {
            (0..self.row_count)
                .filter(|i| !self.exceptions.contains(i))
                .collect()
        } else {
            self.exceptions.iter().copied().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_is_compact() {
        let mut sel = SelectInfo::new(1_000_000);
        sel.select_all();
        assert!(sel.is_select_all());
        assert_eq!(sel.selected_count(), 1_000_000);
        assert!(sel.exceptions.is_empty());
    }

    #[test]
    fn test_exceptions_under_select_all() {
        let mut sel = SelectInfo::new(5);
        sel.select_all();
        sel.set_row_select(2, false);
        assert!(!sel.is_select_all());
        assert!(!sel.is_selected(2));
        assert_eq!(sel.selected(), [0, 1, 3, 4]);
        sel.set_row_select(2, true);
        assert!(sel.is_select_all());
    }

    #[test]
    fn test_individual_selection() {
        let mut sel = SelectInfo::new(10);
        sel.set_row_select(7, true);
        sel.set_row_select(3, true);
        assert_eq!(sel.selected(), [3, 7]);
        assert_eq!(sel.selected_count(), 2);
        sel.deselect_all();
        assert_eq!(sel.selected_count(), 0);
    }

    #[test]
    fn test_out_of_capacity_ignored() {
        let mut sel = SelectInfo::new(3);
        sel.set_row_select(9, true);
        assert!(!sel.is_selected(9));
        assert_eq!(sel.selected_count(), 0);
    }
}
