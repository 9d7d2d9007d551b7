//! Cross-row store assignment rules.
//!
//! Rows sharing a style are *peers*. For a given row:
//!
//! - its `from` selector disables every store a peer already sends *to*;
//! - its `to` selector disables every store a peer sends *from*, plus the
//!   row's own `from`.
//!
//! Disabled sets are recomputed from the row set on every call; nothing is
//! cached. Selecting a disabled store is refused, selecting the current
//! store clears it.

use std::collections::BTreeSet;

use crate::error::SelectionError;
use crate::models::{StoreField, TableRow};

/// Store codes that may not be picked for a row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisabledStores {
    pub from: BTreeSet<String>,
    pub to: BTreeSet<String>,
}

impl DisabledStores {
    pub fn for_field(&self, field: StoreField) -> &BTreeSet<String> {
        match field {
            StoreField::From => &self.from,
            StoreField::To => &self.to,
        }
    }

    pub fn is_disabled(&self, field: StoreField, code: &str) -> bool {
        self.for_field(field).contains(code)
    }
}

/// Outcome of an accepted selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Set(String),
    Cleared,
}

impl Selection {
    pub fn value(&self) -> &str {
        match self {
            Selection::Set(code) => code,
            Selection::Cleared => "",
        }
    }
}

/// Other rows with the same style.
pub fn peers<'a>(rows: &'a [TableRow], row: &'a TableRow) -> impl Iterator<Item = &'a TableRow> {
    rows.iter()
        .filter(move |other| other.id != row.id && other.style == row.style)
}

/// Disabled selector values for `row` given the whole row set.
pub fn disabled_stores(rows: &[TableRow], row: &TableRow) -> DisabledStores {
    let mut disabled = DisabledStores::default();

    for peer in peers(rows, row) {
        if !peer.to.is_empty() {
            disabled.from.insert(peer.to.clone());
        }
        if !peer.from.is_empty() {
            disabled.to.insert(peer.from.clone());
        }
    }
    if !row.from.is_empty() {
        disabled.to.insert(row.from.clone());
    }

    disabled
}

/// Same as [`disabled_stores`], looking the row up by id.
pub fn disabled_stores_for(rows: &[TableRow], id: u64) -> Option<DisabledStores> {
    rows.iter()
        .find(|r| r.id == id)
        .map(|row| disabled_stores(rows, row))
}

/// Decide what selecting `code` in `field` of row `id` does.
///
/// A disabled code is refused, even when it is the current value.
/// Selecting the current value (or an empty code) clears the field.
pub fn select_store(
    rows: &[TableRow],
    id: u64,
    field: StoreField,
    code: &str,
) -> Result<Selection, SelectionError> {
    let row = rows
        .iter()
        .find(|r| r.id == id)
        .ok_or(SelectionError::RowNotFound(id))?;

    if code.is_empty() {
        return Ok(Selection::Cleared);
    }

    if disabled_stores(rows, row).is_disabled(field, code) {
        return Err(SelectionError::Refused {
            code: code.to_string(),
            field,
        });
    }

    if row.store(field) == code {
        Ok(Selection::Cleared)
    } else {
        Ok(Selection::Set(code.to_string()))
    }
}

/// Write an accepted selection into the row set.
pub fn apply_selection(rows: &mut [TableRow], id: u64, field: StoreField, selection: &Selection) {
    if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
        *row.store_mut(field) = selection.value().to_string();
    }
}

/// A pair of rows routing one style back through the same store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConflict {
    pub style: String,
    pub store: String,
    /// Row whose `to` is `store`
    pub receiving_row: u64,
    /// Row whose `from` is `store`
    pub sending_row: u64,
}

/// Every `A.to == B.from` pair within a style.
///
/// The selectors prevent these; they can still arrive through loaded data.
pub fn routing_conflicts(rows: &[TableRow]) -> Vec<RoutingConflict> {
    let mut conflicts = Vec::new();

    for receiving in rows.iter().filter(|r| !r.to.is_empty()) {
        for sending in peers(rows, receiving) {
            if sending.from == receiving.to {
                conflicts.push(RoutingConflict {
                    style: receiving.style.clone(),
                    store: receiving.to.clone(),
                    receiving_row: receiving.id,
                    sending_row: sending.id,
                });
            }
        }
    }

    conflicts
}
