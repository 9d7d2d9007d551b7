//! Application controller.
//!
//! [`TransferSession`] owns the whole editable state: the row set, the
//! master lookup, the store registry and the raw style input. Every
//! operation validates first and then replaces the affected state in one
//! step, so a failed import or load leaves everything as it was.
//!
//! # Architecture
//!
//! ```text
//!                 ┌────────────────────────────────────────────┐
//!  master data ──▶│ MasterLookup                               │
//!                 │      │ enrich                              │
//!  style input ──▶│ input buffer ──▶ rows: Arc<Vec<TableRow>> ─┼──▶ manifest / statistics
//!  scanner     ──▶│                      ▲  selections, notes  │
//!                 │ StoreRegistry ───────┘                     │
//!                 └──────────────┬─────────────────────────────┘
//!                                │ save / load
//!                          KeyValueStore
//! ```
//!
//! The row set is only ever replaced as a whole; readers holding an earlier
//! [`TransferSession::rows`] snapshot keep a consistent view.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{Stream, StreamExt};

use crate::error::{
    ScanRuntimeError, SelectionError, SessionError, SessionResult,
};
use crate::ingest::{ingest_styles, next_id, IngestResult};
use crate::models::{StatisticsSnapshot, StoreField, TableRow, OTHER_NOTE};
use crate::notify::{notify_error, notify_info, notify_success, notify_warning};
use crate::parser::{parse_master_data, MasterLookup};
use crate::persistence::{self, KeyValueStore};
use crate::scan::{FrameDecoder, ScanStream};
use crate::sources::{fetch_master_url, read_master_file};
use crate::stores::StoreRegistry;
use crate::transform::consistency::{self, DisabledStores, Selection};
use crate::transform::processor::{process_requests, ProcessOptions, ProcessOutcome};
use crate::transform::statistics::aggregate;

/// Answer to the "this will overwrite current data" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// Values applied to several rows at once; `None` or empty leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkEdit {
    pub from: Option<String>,
    pub to: Option<String>,
    pub note: Option<String>,
}

impl BulkEdit {
    fn field(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        Self::field(&self.from).is_none()
            && Self::field(&self.to).is_none()
            && Self::field(&self.note).is_none()
    }
}

/// Outcome of [`TransferSession::apply_bulk`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub updated: usize,
    /// Rows left untouched because a store was disabled for them
    pub refused: usize,
    /// Ids with no matching row
    pub missing: usize,
}

/// Publish a failure and hand it back.
fn reported<T>(result: SessionResult<T>) -> SessionResult<T> {
    if let Err(e) = &result {
        notify_error(e.to_string());
    }
    result
}

pub struct TransferSession {
    rows: Arc<Vec<TableRow>>,
    master: MasterLookup,
    stores: StoreRegistry,
    input: String,
    storage: Arc<dyn KeyValueStore>,
}

impl TransferSession {
    /// Start an empty session; the store registry is read from `storage`.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let codes = persistence::load_store_codes(storage.as_ref());
        Self {
            rows: Arc::new(Vec::new()),
            master: MasterLookup::default(),
            stores: StoreRegistry::new(&codes),
            input: String::new(),
            storage,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current row set snapshot.
    pub fn rows(&self) -> Arc<Vec<TableRow>> {
        Arc::clone(&self.rows)
    }

    pub fn row(&self, id: u64) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn master(&self) -> &MasterLookup {
        &self.master
    }

    pub fn stores(&self) -> &StoreRegistry {
        &self.stores
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn disabled_stores(&self, id: u64) -> Option<DisabledStores> {
        consistency::disabled_stores_for(&self.rows, id)
    }

    /// Copy the row set, edit the copy, and swap it in.
    fn update_rows<R>(&mut self, edit: impl FnOnce(&mut Vec<TableRow>) -> R) -> R {
        let mut next = self.rows.as_ref().clone();
        let result = edit(&mut next);
        self.rows = Arc::new(next);
        result
    }

    fn position(&self, id: u64) -> SessionResult<usize> {
        self.rows
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| SelectionError::RowNotFound(id).into())
    }

    // =========================================================================
    // Master Data
    // =========================================================================

    /// Replace the master lookup from delimited text; returns the record count.
    pub fn import_master_text(&mut self, text: &str) -> SessionResult<usize> {
        let parsed = reported(parse_master_data(text).map_err(SessionError::from))?;
        notify_success(parsed.summary());

        let count = parsed.records.len();
        self.master.replace(parsed.records);
        Ok(count)
    }

    pub async fn import_master_file(&mut self, path: impl AsRef<Path>) -> SessionResult<usize> {
        let text = reported(read_master_file(path).await.map_err(SessionError::from))?;
        self.import_master_text(&text)
    }

    pub async fn import_master_url(&mut self, url: &str) -> SessionResult<usize> {
        let text = reported(fetch_master_url(url).await)?;
        self.import_master_text(&text)
    }

    // =========================================================================
    // Style Input
    // =========================================================================

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Append one code on its own line.
    pub fn append_input_line(&mut self, code: &str) {
        if !self.input.is_empty() && !self.input.ends_with('\n') {
            self.input.push('\n');
        }
        self.input.push_str(code);
    }

    /// Turn the input buffer into rows and clear it.
    ///
    /// When no ids are left for the new rows nothing is added and the
    /// buffer is kept.
    pub fn load_styles(&mut self) -> SessionResult<IngestResult> {
        if self.input.trim().is_empty() {
            return Ok(IngestResult::default());
        }

        let result = reported(ingest_styles(&self.input, &self.rows, &self.master).map_err(SessionError::from))?;
        let new_rows = result.rows.clone();
        self.update_rows(|rows| rows.extend(new_rows));
        self.input.clear();

        if self.master.is_empty() {
            notify_info(format!("Loaded {} styles.", result.rows.len()));
        } else {
            notify_success(result.summary());
        }
        Ok(result)
    }

    // =========================================================================
    // Row Edits
    // =========================================================================

    fn select(&mut self, id: u64, field: StoreField, code: &str) -> SessionResult<Selection> {
        let selection = consistency::select_store(&self.rows, id, field, code);
        let selection = reported(selection.map_err(SessionError::from))?;
        self.update_rows(|rows| consistency::apply_selection(rows, id, field, &selection));
        Ok(selection)
    }

    /// Pick the sending store; picking the current one clears it.
    pub fn select_from(&mut self, id: u64, code: &str) -> SessionResult<Selection> {
        self.select(id, StoreField::From, code)
    }

    /// Pick the receiving store; picking the current one clears it.
    pub fn select_to(&mut self, id: u64, code: &str) -> SessionResult<Selection> {
        self.select(id, StoreField::To, code)
    }

    pub fn set_note(&mut self, id: u64, note: &str) -> SessionResult<()> {
        let pos = self.position(id)?;
        self.update_rows(|rows| {
            let row = &mut rows[pos];
            row.note = note.to_string();
            if note != OTHER_NOTE {
                row.custom_note.clear();
            }
        });
        Ok(())
    }

    pub fn set_custom_note(&mut self, id: u64, text: &str) -> SessionResult<()> {
        let pos = self.position(id)?;
        self.update_rows(|rows| rows[pos].custom_note = text.to_string());
        Ok(())
    }

    /// Insert an unassigned copy right after the row; returns the new id.
    pub fn duplicate_row(&mut self, id: u64) -> SessionResult<u64> {
        let pos = self.position(id)?;
        let new_id = reported(next_id(&self.rows).map_err(SessionError::from))?;
        self.update_rows(|rows| {
            let copy = rows[pos].duplicate(new_id);
            rows.insert(pos + 1, copy);
        });
        Ok(new_id)
    }

    pub fn delete_row(&mut self, id: u64) -> SessionResult<TableRow> {
        let pos = self.position(id)?;
        Ok(self.update_rows(|rows| rows.remove(pos)))
    }

    /// Drop every row and the pending input.
    pub fn clear_all(&mut self) {
        self.rows = Arc::new(Vec::new());
        self.input.clear();
    }

    /// Apply the same stores and note to several rows.
    ///
    /// Each store is checked against the row's disabled set as it stands
    /// after the rows before it were updated. A row with a disabled store
    /// is left unchanged.
    pub fn apply_bulk(&mut self, ids: &[u64], edit: &BulkEdit) -> BulkReport {
        let mut report = BulkReport::default();
        if ids.is_empty() || edit.is_empty() {
            return report;
        }

        let from = BulkEdit::field(&edit.from);
        let to = BulkEdit::field(&edit.to);
        let note = BulkEdit::field(&edit.note);

        self.update_rows(|rows| {
            for &id in ids {
                let Some(pos) = rows.iter().position(|r| r.id == id) else {
                    report.missing += 1;
                    continue;
                };

                let disabled = consistency::disabled_stores(rows, &rows[pos]);
                let refused = from.is_some_and(|c| disabled.is_disabled(StoreField::From, c))
                    || to.is_some_and(|c| disabled.is_disabled(StoreField::To, c));
                if refused {
                    report.refused += 1;
                    continue;
                }

                let row = &mut rows[pos];
                if let Some(code) = from {
                    row.from = code.to_string();
                }
                if let Some(code) = to {
                    row.to = code.to_string();
                }
                if let Some(note) = note {
                    row.note = note.to_string();
                    if note != OTHER_NOTE {
                        row.custom_note.clear();
                    }
                }
                report.updated += 1;
            }
        });

        notify_success(format!("Applied changes to {} rows.", report.updated));
        if report.refused > 0 {
            notify_warning(format!(
                "{} rows were left unchanged because a store is not allowed for their style.",
                report.refused
            ));
        }
        report
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    pub fn save_progress(&self) -> SessionResult<()> {
        match persistence::save_progress(self.storage.as_ref(), &self.rows) {
            Ok(()) => {
                notify_success("Progress saved successfully!");
                Ok(())
            }
            Err(e) => reported(Err(e)),
        }
    }

    /// Replace the row set with the saved snapshot.
    ///
    /// Requires confirmation since current rows are overwritten.
    pub fn load_progress(&mut self, confirmation: Confirmation) -> SessionResult<usize> {
        if confirmation != Confirmation::Confirmed {
            return Err(SessionError::ConfirmationRequired(
                "Loading progress will overwrite the current table.".into(),
            ));
        }

        let rows = reported(persistence::load_progress(self.storage.as_ref()))?;
        let rows = reported(rows.ok_or(SessionError::NoSavedProgress))?;

        let count = self.install_snapshot(rows);
        notify_success("Progress loaded successfully!");
        Ok(count)
    }

    /// Pick up the saved snapshot at startup, if there is a usable one.
    ///
    /// An unreadable record is reported as a warning and the session keeps
    /// its current rows; the record stays in storage until it is saved over
    /// or discarded.
    pub fn resume_saved(&mut self) -> usize {
        match persistence::load_progress(self.storage.as_ref()) {
            Ok(Some(rows)) => self.install_snapshot(rows),
            Ok(None) => 0,
            Err(e) => {
                notify_warning(format!("{}. Starting with an empty table.", e));
                0
            }
        }
    }

    /// Remove the saved snapshot from storage; live rows are untouched.
    pub fn discard_saved_progress(&self) -> SessionResult<()> {
        reported(persistence::clear_progress(self.storage.as_ref()))
    }

    fn install_snapshot(&mut self, rows: Vec<TableRow>) -> usize {
        let conflicts = consistency::routing_conflicts(&rows);
        if !conflicts.is_empty() {
            let styles: Vec<&str> = conflicts.iter().map(|c| c.style.as_str()).collect();
            notify_warning(format!(
                "Loaded data routes {} style(s) back through the same store: {}",
                conflicts.len(),
                styles.join(", ")
            ));
        }

        let count = rows.len();
        self.rows = Arc::new(rows);
        count
    }

    /// The saved snapshot without touching the live rows.
    pub fn saved_progress(&self) -> SessionResult<Vec<TableRow>> {
        persistence::load_progress(self.storage.as_ref())?.ok_or(SessionError::NoSavedProgress)
    }

    // =========================================================================
    // Store Registry
    // =========================================================================

    fn commit_stores(&mut self, stores: StoreRegistry) -> SessionResult<()> {
        reported(persistence::save_store_codes(self.storage.as_ref(), stores.codes()))?;
        self.stores = stores;
        Ok(())
    }

    pub fn add_store(&mut self, name: &str) -> SessionResult<String> {
        let mut stores = self.stores.clone();
        let code = reported(stores.add(name).map_err(SessionError::from))?;
        self.commit_stores(stores)?;
        notify_success(format!("Store \"{}\" added.", code));
        Ok(code)
    }

    pub fn remove_store(&mut self, code: &str) -> SessionResult<()> {
        let mut stores = self.stores.clone();
        reported(stores.remove(code, &self.rows).map_err(SessionError::from))?;
        self.commit_stores(stores)?;
        notify_success(format!("Store \"{}\" removed.", code));
        Ok(())
    }

    pub fn rename_store(&mut self, old: &str, new: &str) -> SessionResult<String> {
        let mut stores = self.stores.clone();
        let code = reported(stores.rename(old, new, &self.rows).map_err(SessionError::from))?;
        self.commit_stores(stores)?;
        notify_success(format!("Store \"{}\" renamed to \"{}\".", old, code));
        Ok(code)
    }

    // =========================================================================
    // Processing & Statistics
    // =========================================================================

    pub async fn process(&self, options: &ProcessOptions) -> ProcessOutcome {
        let rows = self.rows();
        let outcome = process_requests(&rows, options).await;
        if outcome == ProcessOutcome::Empty {
            notify_info("No data in the table to process.");
        }
        outcome
    }

    /// Statistics over the live rows; `None` when the table is empty.
    pub fn statistics(&self) -> Option<StatisticsSnapshot> {
        if self.rows.is_empty() {
            notify_info("No data available to generate statistics.");
            return None;
        }
        Some(aggregate(self.rows.iter()))
    }

    /// Statistics over the saved snapshot.
    pub fn progress_statistics(&self) -> SessionResult<StatisticsSnapshot> {
        let rows = reported(self.saved_progress())?;
        Ok(aggregate(&rows))
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Start a scanner, reporting device failures.
    pub fn start_scan<D: FrameDecoder>(&self, decoder: D) -> SessionResult<ScanStream> {
        reported(ScanStream::start(decoder).map_err(SessionError::from))
    }

    /// Append scanned codes to the input buffer.
    ///
    /// Stops after `limit` codes, at the end of the stream, or at the first
    /// decode failure. Returns the number of codes appended.
    pub async fn collect_scans<S>(&mut self, mut stream: S, limit: Option<usize>) -> SessionResult<usize>
    where
        S: Stream<Item = Result<String, ScanRuntimeError>> + Unpin,
    {
        let mut count = 0;
        while limit.map_or(true, |max| count < max) {
            match stream.next().await {
                Some(Ok(code)) => {
                    self.append_input_line(&code);
                    count += 1;
                }
                Some(Err(e)) => return reported(Err(e.into())),
                None => break,
            }
        }
        Ok(count)
    }
}
