//! Derived views over the row set: filtering, sorting, row highlighting
//! and the saved-progress view.
//!
//! All functions are pure and recomputed on demand.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::TableRow;

/// Number of colours available to tell duplicate groups apart.
pub const DUPLICATE_PALETTE_SIZE: usize = 6;

// =============================================================================
// Filtering
// =============================================================================

/// Column a text filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterColumn {
    #[default]
    All,
    Brand,
    Style,
    Description,
    From,
    To,
}

impl FilterColumn {
    fn value<'a>(&self, row: &'a TableRow) -> &'a str {
        match self {
            FilterColumn::Brand => &row.brand,
            FilterColumn::Style => &row.style,
            FilterColumn::Description => &row.description,
            FilterColumn::From => &row.from,
            FilterColumn::To => &row.to,
            FilterColumn::All => "",
        }
    }
}

/// Case-insensitive substring filter. An empty filter keeps every row.
pub fn filter_rows<'a>(rows: &'a [TableRow], column: FilterColumn, text: &str) -> Vec<&'a TableRow> {
    if text.is_empty() {
        return rows.iter().collect();
    }
    let needle = text.to_lowercase();
    let matches = |value: &str| value.to_lowercase().contains(&needle);

    rows.iter()
        .filter(|row| match column {
            FilterColumn::All => [
                FilterColumn::Brand,
                FilterColumn::Style,
                FilterColumn::Description,
                FilterColumn::From,
                FilterColumn::To,
            ]
            .iter()
            .any(|c| matches(c.value(row))),
            column => matches(column.value(row)),
        })
        .collect()
}

// =============================================================================
// Sorting
// =============================================================================

/// Sortable table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    DisplayId,
    Brand,
    Style,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Current table sort; `key == None` keeps insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortConfig {
    pub key: Option<SortKey>,
    pub direction: SortDirection,
}

impl SortConfig {
    /// Sort by `key`; asking for the same key again flips the direction.
    pub fn request(self, key: SortKey) -> Self {
        let direction = if self.key == Some(key) && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        Self {
            key: Some(key),
            direction,
        }
    }
}

fn compare_by_key(a: &TableRow, b: &TableRow, key: SortKey) -> Ordering {
    let text = |row: &TableRow| -> String {
        match key {
            SortKey::Brand => row.brand.to_lowercase(),
            SortKey::Style => row.style.to_lowercase(),
            SortKey::Description => row.description.to_lowercase(),
            SortKey::DisplayId => String::new(),
        }
    };
    match key {
        SortKey::DisplayId => a.display_id.cmp(&b.display_id),
        _ => text(a).cmp(&text(b)),
    }
}

/// Stable sort of a row view.
pub fn sort_rows(rows: &mut [&TableRow], config: SortConfig) {
    let Some(key) = config.key else {
        return;
    };
    rows.sort_by(|a, b| {
        let ordering = compare_by_key(a, b, key);
        match config.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

// =============================================================================
// Row Status
// =============================================================================

/// How a row should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Sending store chosen, receiving store missing
    PartiallyAssigned,
    /// Shares its display id with other rows; the value picks a colour
    DuplicateGroup(usize),
    Plain,
}

/// Palette slot for each display id used by more than one row,
/// assigned in ascending display id order.
pub fn duplicate_groups(rows: &[TableRow]) -> BTreeMap<u64, usize> {
    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    for row in rows {
        *counts.entry(row.display_id).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .enumerate()
        .map(|(index, (display_id, _))| (display_id, index % DUPLICATE_PALETTE_SIZE))
        .collect()
}

pub fn row_status(rows: &[TableRow], row: &TableRow) -> RowStatus {
    if row.is_partially_assigned() {
        return RowStatus::PartiallyAssigned;
    }
    match duplicate_groups(rows).get(&row.display_id) {
        Some(slot) => RowStatus::DuplicateGroup(*slot),
        None => RowStatus::Plain,
    }
}

/// Sorted, de-duplicated display ids of rows missing a store.
pub fn incomplete_display_ids(rows: &[TableRow]) -> Vec<u64> {
    rows.iter()
        .filter(|row| !row.is_complete())
        .map(|row| row.display_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// =============================================================================
// Saved Progress View
// =============================================================================

/// Which saved rows the progress view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Rows with at least one store, routing order
    #[default]
    Default,
    /// Every row in saved order
    Original,
    /// Every row, routing order
    All,
}

fn routing_key(row: &TableRow) -> (String, String, String, String) {
    (
        row.from.to_lowercase(),
        row.to.to_lowercase(),
        row.brand.to_lowercase(),
        row.style.to_lowercase(),
    )
}

/// Rows for the saved-progress view.
///
/// `search` holds style codes, one per line, matched case-insensitively
/// and exactly.
pub fn progress_view(rows: &[TableRow], mode: ViewMode, search: &str) -> Vec<TableRow> {
    let wanted: BTreeSet<String> = search
        .lines()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let mut view: Vec<TableRow> = rows
        .iter()
        .filter(|row| wanted.is_empty() || wanted.contains(&row.style.to_lowercase()))
        .filter(|row| mode != ViewMode::Default || !row.from.is_empty() || !row.to.is_empty())
        .cloned()
        .collect();

    if mode != ViewMode::Original {
        view.sort_by_cached_key(routing_key);
    }

    view
}
