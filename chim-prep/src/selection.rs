//! Selectable accounts and channels
//!
//! Two independent ordered collections. Row membership is fixed once loaded;
//! only the `do_import` flags change, and only through the reducers below.
//! The bulk checkbox state is always derived from the rows, never stored.

use chim_common::models::{ImportChannel, ImportUser};
use serde::Serialize;
use std::collections::HashMap;

/// A row that can be included in or excluded from the import
pub trait Selectable {
    fn key(&self) -> &str;

    /// Rows the bulk toggle strips first (deleted accounts, archived channels)
    fn is_flagged(&self) -> bool;

    fn do_import(&self) -> bool;

    fn set_do_import(&mut self, value: bool);
}

impl Selectable for ImportUser {
    fn key(&self) -> &str {
        &self.user_id
    }

    fn is_flagged(&self) -> bool {
        self.is_deleted
    }

    fn do_import(&self) -> bool {
        self.do_import
    }

    fn set_do_import(&mut self, value: bool) {
        self.do_import = value;
    }
}

impl Selectable for ImportChannel {
    fn key(&self) -> &str {
        &self.channel_id
    }

    fn is_flagged(&self) -> bool {
        self.is_archived
    }

    fn do_import(&self) -> bool {
        self.do_import
    }

    fn set_do_import(&mut self, value: bool) {
        self.do_import = value;
    }
}

/// Tri-state header checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkCheckState {
    pub checked: bool,
    pub indeterminate: bool,
}

/// What a bulk toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkToggle {
    /// Nothing was selected; everything is selected now
    SelectedAll,
    /// Flagged rows were deselected; other rows kept their flags
    DeselectedFlagged,
    /// Everything is deselected now
    DeselectedAll,
}

/// Ordered rows with an id → position index
#[derive(Debug, Clone)]
pub struct SelectionList<T> {
    rows: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for SelectionList<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Selectable> SelectionList<T> {
    /// Load rows with every entry selected
    ///
    /// A repeated id keeps its first position in the index; later duplicates
    /// stay in the list but are only reachable through the bulk toggle.
    pub fn load(rows: Vec<T>) -> Self {
        let mut rows = rows;
        let mut index = HashMap::with_capacity(rows.len());
        for (position, row) in rows.iter_mut().enumerate() {
            row.set_do_import(true);
            index.entry(row.key().to_string()).or_insert(position);
        }
        Self { rows, index }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.rows.iter().filter(|row| row.do_import()).count()
    }

    pub fn bulk_state(&self) -> BulkCheckState {
        let selected = self.selected_count();
        BulkCheckState {
            checked: selected > 0,
            indeterminate: selected > 0 && selected < self.rows.len(),
        }
    }

    /// Flip one row. Returns the new flag, or `None` for an unknown id.
    pub fn toggle_one(&mut self, key: &str) -> Option<bool> {
        let position = *self.index.get(key)?;
        let row = &mut self.rows[position];
        let value = !row.do_import();
        row.set_do_import(value);
        Some(value)
    }

    /// Header checkbox click
    ///
    /// - nothing selected → select all
    /// - a flagged row is selected → deselect flagged rows only
    /// - otherwise → deselect all
    pub fn toggle_all(&mut self) -> BulkToggle {
        if self.selected_count() == 0 {
            self.rows.iter_mut().for_each(|row| row.set_do_import(true));
            return BulkToggle::SelectedAll;
        }

        let flagged_selected = self
            .rows
            .iter()
            .any(|row| row.is_flagged() && row.do_import());

        if flagged_selected {
            self.rows
                .iter_mut()
                .filter(|row| row.is_flagged())
                .for_each(|row| row.set_do_import(false));
            BulkToggle::DeselectedFlagged
        } else {
            self.rows.iter_mut().for_each(|row| row.set_do_import(false));
            BulkToggle::DeselectedAll
        }
    }

    /// Rows in their original order, selection flags included
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.rows.clone()
    }
}

/// Accounts and channels offered for import
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub users: SelectionList<ImportUser>,
    pub channels: SelectionList<ImportChannel>,
}

impl SelectionState {
    pub fn load(users: Vec<ImportUser>, channels: Vec<ImportChannel>) -> Self {
        Self {
            users: SelectionList::load(users),
            channels: SelectionList::load(channels),
        }
    }
}
