//! Style-list ingestion.
//!
//! Turns the raw style input (typed, scanned or pasted) into new
//! [`TableRow`]s, enriched from the master data when a style is known.
//!
//! Two input forms are accepted:
//!
//! ```text
//! Plain (one style per line)      CSV mode (marker line first)
//! ┌──────────────────────┐        ┌───────────────────────────────┐
//! │ DD5975 010           │        │ #CSV                          │
//! │ cw9610 010           │        │ NIKE,DD5975 010,Air Force 1   │
//! └──────────────────────┘        │ ADIDAS,GZ1234,Samba           │
//!                                 └───────────────────────────────┘
//! ```
//!
//! In plain mode the whole trimmed, upper-cased line is the style code,
//! spaces included. CSV mode splits on the first two commas without quote
//! handling; the description keeps any further commas as written.

use crate::error::{InputFormatError, InputResult};
use crate::models::{TableRow, MAX_ROW_ID};
use crate::parser::MasterLookup;

/// Marker line that switches the style input to CSV mode.
pub const CSV_MODE_MARKER: &str = "#CSV";

/// One style requested by the user, before it becomes a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleEntry {
    pub style: String,
    pub brand: String,
    pub description: String,
}

impl StyleEntry {
    fn plain(line: &str) -> Self {
        Self {
            style: line.trim().to_uppercase(),
            brand: String::new(),
            description: String::new(),
        }
    }
}

/// Entries parsed from the raw input plus the lines that could not be used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStyleInput {
    pub entries: Vec<StyleEntry>,
    pub skipped: usize,
}

/// Rows produced by one ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestResult {
    /// New rows, ids ascending in input order
    pub rows: Vec<TableRow>,
    /// Rows that picked up brand/description from the master data
    pub enriched: usize,
    /// CSV-mode lines without a style
    pub skipped: usize,
}

impl IngestResult {
    pub fn summary(&self) -> String {
        let mut message = format!(
            "Loaded {} styles. Found details for {}.",
            self.rows.len(),
            self.enriched
        );
        if self.skipped > 0 {
            message.push_str(&format!(" {} line(s) without a style were skipped.", self.skipped));
        }
        message
    }
}

fn is_csv_mode(first_line: &str) -> bool {
    first_line.trim().eq_ignore_ascii_case(CSV_MODE_MARKER)
}

fn is_csv_header(fields: &[String]) -> bool {
    matches!(
        fields,
        [brand, style, ..] if brand == "BRAND" && (style == "STYLE" || style == "STYLE #")
    )
}

/// Split the raw input into style entries.
pub fn parse_style_input(input: &str) -> ParsedStyleInput {
    let mut lines = input.lines().filter(|line| !line.trim().is_empty()).peekable();

    let csv_mode = lines.peek().is_some_and(|first| is_csv_mode(first));
    if !csv_mode {
        return ParsedStyleInput {
            entries: lines.map(StyleEntry::plain).collect(),
            skipped: 0,
        };
    }

    lines.next();
    let mut parsed = ParsedStyleInput::default();

    for line in lines {
        let fields: Vec<String> = line
            .splitn(3, ',')
            .map(|f| f.trim().to_uppercase())
            .collect();

        if is_csv_header(&fields) {
            continue;
        }

        let style = fields.get(1).cloned().unwrap_or_default();
        if style.is_empty() {
            parsed.skipped += 1;
            continue;
        }

        parsed.entries.push(StyleEntry {
            brand: fields.first().cloned().unwrap_or_default(),
            style,
            description: fields.get(2).cloned().unwrap_or_default(),
        });
    }

    parsed
}

/// First of `count` fresh ids: one above the current maximum, or 1 for an
/// empty set. Every allocated id stays at or below [`MAX_ROW_ID`].
pub fn allocate_ids(rows: &[TableRow], count: usize) -> InputResult<u64> {
    let first = rows.iter().map(|r| r.id).max().unwrap_or(0).checked_add(1);
    let last = first.and_then(|first| first.checked_add(count.saturating_sub(1) as u64));

    match (first, last) {
        (Some(first), Some(last)) if last <= MAX_ROW_ID => Ok(first),
        _ => Err(InputFormatError::IdsExhausted {
            requested: count,
            max: MAX_ROW_ID,
        }),
    }
}

/// Next free id for a single new row.
pub fn next_id(rows: &[TableRow]) -> InputResult<u64> {
    allocate_ids(rows, 1)
}

/// Build rows for every style in `input`.
///
/// Ids start above the highest existing id and follow input order.
/// Unknown styles are not an error; their brand and description stay empty.
pub fn ingest_styles(input: &str, existing: &[TableRow], master: &MasterLookup) -> InputResult<IngestResult> {
    let parsed = parse_style_input(input);
    let mut result = IngestResult {
        skipped: parsed.skipped,
        ..IngestResult::default()
    };
    if parsed.entries.is_empty() {
        return Ok(result);
    }

    let first_id = allocate_ids(existing, parsed.entries.len())?;

    for (offset, entry) in parsed.entries.into_iter().enumerate() {
        let mut row = TableRow::new(first_id + offset as u64, entry.style);
        row.brand = entry.brand;
        row.description = entry.description;

        if row.brand.is_empty() || row.description.is_empty() {
            if let Some(record) = master.find(&row.style) {
                if row.brand.is_empty() {
                    row.brand = record.brand.clone();
                }
                if row.description.is_empty() {
                    row.description = record.description.clone();
                }
                result.enriched += 1;
            }
        }

        result.rows.push(row);
    }

    Ok(result)
}
