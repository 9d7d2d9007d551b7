//! Domain models for the transfer-request engine.
//!
//! - [`StyleMasterRecord`] - Reference data mapping a style code to brand/description
//! - [`TableRow`] - The canonical work item, one requested transfer line
//! - [`ProcessedRequest`] - Read-only manifest entry produced by processing
//! - [`StatisticsSnapshot`] - Sender totals and the sender × receiver matrix
//! - [`StoreField`] - Which side of a row a store selection targets

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Note value whose text comes from `custom_note`.
pub const OTHER_NOTE: &str = "Other";

/// Largest row id a saved snapshot may carry (2^53 - 1).
pub const MAX_ROW_ID: u64 = 9_007_199_254_740_991;

// =============================================================================
// Master Data
// =============================================================================

/// One line of master data. All fields are upper-cased on ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleMasterRecord {
    pub brand: String,
    pub style: String,
    pub description: String,
}

impl StyleMasterRecord {
    pub fn new(brand: &str, style: &str, description: &str) -> Self {
        Self {
            brand: brand.to_uppercase(),
            style: style.to_uppercase(),
            description: description.to_uppercase(),
        }
    }
}

// =============================================================================
// Table Row
// =============================================================================

/// Side of a transfer a store code is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreField {
    From,
    To,
}

impl fmt::Display for StoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreField::From => write!(f, "from"),
            StoreField::To => write!(f, "to"),
        }
    }
}

/// A single transfer request line.
///
/// `id` is the unique identity used for edits; `display_id` is shared
/// between a row and its duplicates. Serialized field names match the
/// saved-progress record (`displayId`, `customNote`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub id: u64,
    pub display_id: u64,
    pub brand: String,
    pub style: String,
    pub description: String,
    pub from: String,
    pub to: String,
    pub note: String,
    #[serde(default)]
    pub custom_note: String,
}

impl TableRow {
    /// Create a fresh, unassigned row whose display id equals its id.
    pub fn new(id: u64, style: impl Into<String>) -> Self {
        Self {
            id,
            display_id: id,
            brand: String::new(),
            style: style.into(),
            description: String::new(),
            from: String::new(),
            to: String::new(),
            note: String::new(),
            custom_note: String::new(),
        }
    }

    /// Both stores assigned.
    pub fn is_complete(&self) -> bool {
        !self.from.is_empty() && !self.to.is_empty()
    }

    /// Sending store set, receiving store still empty.
    pub fn is_partially_assigned(&self) -> bool {
        !self.from.is_empty() && self.to.is_empty()
    }

    /// The note as it should appear in a manifest.
    pub fn resolved_note(&self) -> &str {
        if self.note == OTHER_NOTE {
            &self.custom_note
        } else {
            &self.note
        }
    }

    pub fn store(&self, field: StoreField) -> &str {
        match field {
            StoreField::From => &self.from,
            StoreField::To => &self.to,
        }
    }

    pub fn store_mut(&mut self, field: StoreField) -> &mut String {
        match field {
            StoreField::From => &mut self.from,
            StoreField::To => &mut self.to,
        }
    }

    /// Copy of this row under a new id, keeping the display id and
    /// clearing every assignment.
    pub fn duplicate(&self, new_id: u64) -> Self {
        Self {
            id: new_id,
            display_id: self.display_id,
            brand: self.brand.clone(),
            style: self.style.clone(),
            description: self.description.clone(),
            from: String::new(),
            to: String::new(),
            note: String::new(),
            custom_note: String::new(),
        }
    }
}

// =============================================================================
// Processed Request
// =============================================================================

/// A finalized manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedRequest {
    pub id: u64,
    pub display_id: u64,
    pub brand: String,
    pub style: String,
    pub description: String,
    pub sender: String,
    pub receiver: String,
    pub note: String,
}

impl From<&TableRow> for ProcessedRequest {
    fn from(row: &TableRow) -> Self {
        Self {
            id: row.id,
            display_id: row.display_id,
            brand: row.brand.clone(),
            style: row.style.clone(),
            description: row.description.clone(),
            sender: row.from.clone(),
            receiver: row.to.clone(),
            note: row.resolved_note().to_string(),
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Totals for one sending store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderStats {
    pub total_styles_sent: usize,
    pub unique_styles_sent_count: usize,
    pub styles_to_receivers: BTreeMap<String, usize>,
}

/// Aggregate view of a row set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    pub sender_stats: BTreeMap<String, SenderStats>,
    pub total_unique_styles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_serializes_with_saved_field_names() {
        let row = TableRow::new(7, "AB1234");
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["displayId"], 7);
        assert_eq!(json["customNote"], "");
    }

    #[test]
    fn test_custom_note_is_optional_on_load() {
        let json = r#"{"id":1,"displayId":1,"brand":"","style":"X","description":"",
            "from":"","to":"","note":""}"#;
        let row: TableRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.custom_note, "");
    }

    #[test]
    fn test_resolved_note() {
        let mut row = TableRow::new(1, "X");
        row.note = "SEND 6".into();
        row.custom_note = "ignored".into();
        assert_eq!(row.resolved_note(), "SEND 6");

        row.note = OTHER_NOTE.into();
        assert_eq!(row.resolved_note(), "ignored");
    }

    #[test]
    fn test_duplicate_keeps_display_id_and_clears_assignment() {
        let mut row = TableRow::new(3, "X1");
        row.brand = "NIKE".into();
        row.from = "A".into();
        row.to = "B".into();
        row.note = "SEND 6".into();

        let copy = row.duplicate(9);
        assert_eq!(copy.id, 9);
        assert_eq!(copy.display_id, 3);
        assert_eq!(copy.brand, "NIKE");
        assert!(copy.from.is_empty() && copy.to.is_empty() && copy.note.is_empty());
    }

    #[test]
    fn test_processed_request_from_row() {
        let mut row = TableRow::new(2, "S1");
        row.from = "A".into();
        row.to = "B".into();
        row.note = OTHER_NOTE.into();
        row.custom_note = "rush".into();

        let req = ProcessedRequest::from(&row);
        assert_eq!(req.sender, "A");
        assert_eq!(req.receiver, "B");
        assert_eq!(req.note, "rush");
    }
}
