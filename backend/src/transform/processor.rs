//! Turn the row set into a sorted transfer manifest.
//!
//! # Example
//!
//! ```rust,ignore
//! use stocktransfer::transform::processor::{process_requests, ProcessOptions, ProcessOutcome};
//!
//! match process_requests(&rows, &ProcessOptions::default()).await {
//!     ProcessOutcome::Empty => println!("nothing to process"),
//!     ProcessOutcome::NeedsConfirmation { display_ids } => println!("incomplete: {:?}", display_ids),
//!     ProcessOutcome::Manifest(manifest) => println!("{} requests", manifest.len()),
//! }
//! ```

use std::time::Duration;

use crate::models::{ProcessedRequest, TableRow};
use crate::notify::{notify_info, notify_success};
use super::view::incomplete_display_ids;

/// Check performed before processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    /// No rows at all
    Empty,
    /// Some rows miss a store; the caller must confirm
    Incomplete { display_ids: Vec<u64> },
    Ready,
}

/// Options for [`process_requests`]
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    /// Process even when some rows are incomplete
    pub proceed_with_incomplete: bool,
    /// Delay before the manifest is handed back
    pub pacing: Duration,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            proceed_with_incomplete: false,
            pacing: Duration::from_millis(500),
        }
    }
}

/// Result of a processing request
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Nothing to process (informational)
    Empty,
    /// Incomplete rows found and not confirmed
    NeedsConfirmation { display_ids: Vec<u64> },
    /// Full manifest, incomplete rows included
    Manifest(Vec<ProcessedRequest>),
}

pub fn preflight(rows: &[TableRow]) -> Preflight {
    if rows.is_empty() {
        return Preflight::Empty;
    }
    let display_ids = incomplete_display_ids(rows);
    if display_ids.is_empty() {
        Preflight::Ready
    } else {
        Preflight::Incomplete { display_ids }
    }
}

/// Case-insensitive (sender, receiver, brand, style) sort key.
pub fn manifest_key(request: &ProcessedRequest) -> (String, String, String, String) {
    (
        request.sender.to_lowercase(),
        request.receiver.to_lowercase(),
        request.brand.to_lowercase(),
        request.style.to_lowercase(),
    )
}

/// Map every row to a request and sort.
///
/// The sort is stable: rows with equal keys keep their table order.
pub fn build_manifest(rows: &[TableRow]) -> Vec<ProcessedRequest> {
    let mut manifest: Vec<ProcessedRequest> = rows.iter().map(ProcessedRequest::from).collect();
    manifest.sort_by_cached_key(manifest_key);
    manifest
}

/// Process the row set without blocking the caller.
///
/// Always returns the full manifest once started; there is no cancellation
/// and no partial result.
pub async fn process_requests(rows: &[TableRow], options: &ProcessOptions) -> ProcessOutcome {
    match preflight(rows) {
        Preflight::Empty => return ProcessOutcome::Empty,
        Preflight::Incomplete { display_ids } if !options.proceed_with_incomplete => {
            return ProcessOutcome::NeedsConfirmation { display_ids };
        }
        _ => {}
    }

    notify_info(format!("Processing {} requests...", rows.len()));
    let manifest = build_manifest(rows);

    if !options.pacing.is_zero() {
        tokio::time::sleep(options.pacing).await;
    }

    notify_success(format!("{} requests ready for export", manifest.len()));
    ProcessOutcome::Manifest(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u64, brand: &str, style: &str, from: &str, to: &str) -> TableRow {
        let mut row = TableRow::new(id, style);
        row.brand = brand.into();
        row.from = from.into();
        row.to = to.into();
        row
    }

    fn immediate() -> ProcessOptions {
        ProcessOptions {
            proceed_with_incomplete: false,
            pacing: Duration::ZERO,
        }
    }

    #[test]
    fn test_sender_orders_manifest() {
        let rows = vec![row(1, "N", "S2", "B", "A"), row(2, "N", "S1", "A", "B")];
        let manifest = build_manifest(&rows);
        let styles: Vec<&str> = manifest.iter().map(|r| r.style.as_str()).collect();
        assert_eq!(styles, vec!["S1", "S2"]);
    }

    #[test]
    fn test_sort_priority_and_case() {
        let rows = vec![
            row(1, "puma", "Z", "AL", "BR"),
            row(2, "NIKE", "B", "AL", "BR"),
            row(3, "nike", "a", "al", "BR"),
            row(4, "ADIDAS", "Q", "AL", "aa"),
        ];
        let ids: Vec<u64> = build_manifest(&rows).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let rows = vec![
            row(5, "N", "S", "A", "B"),
            row(2, "n", "s", "a", "b"),
            row(9, "N", "S", "A", "B"),
        ];
        let ids: Vec<u64> = build_manifest(&rows).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[test]
    fn test_manifest_is_sorted() {
        let stores = ["b", "A", "c", ""];
        let mut rows = Vec::new();
        for (i, from) in stores.iter().enumerate() {
            for (j, to) in stores.iter().enumerate() {
                rows.push(row((i * 4 + j) as u64, stores[j], stores[i], from, to));
            }
        }
        let manifest = build_manifest(&rows);
        assert!(manifest.windows(2).all(|w| manifest_key(&w[0]) <= manifest_key(&w[1])));
        assert_eq!(manifest.len(), rows.len());
    }

    #[test]
    fn test_preflight() {
        assert_eq!(preflight(&[]), Preflight::Empty);
        assert_eq!(preflight(&[row(1, "N", "S", "A", "B")]), Preflight::Ready);
        assert_eq!(
            preflight(&[row(1, "N", "S", "A", ""), row(2, "N", "S", "A", "B")]),
            Preflight::Incomplete { display_ids: vec![1] }
        );
    }

    #[tokio::test]
    async fn test_process_empty_is_refused() {
        assert_eq!(process_requests(&[], &immediate()).await, ProcessOutcome::Empty);
    }

    #[tokio::test]
    async fn test_incomplete_needs_confirmation_then_included() {
        let rows = vec![row(1, "N", "S1", "A", ""), row(2, "N", "S2", "", "")];

        let outcome = process_requests(&rows, &immediate()).await;
        assert_eq!(
            outcome,
            ProcessOutcome::NeedsConfirmation { display_ids: vec![1, 2] }
        );

        let options = ProcessOptions {
            proceed_with_incomplete: true,
            ..immediate()
        };
        match process_requests(&rows, &options).await {
            ProcessOutcome::Manifest(manifest) => assert_eq!(manifest.len(), 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_delay_is_awaited() {
        let rows = vec![row(1, "N", "S1", "A", "B")];
        let options = ProcessOptions {
            proceed_with_incomplete: false,
            pacing: Duration::from_millis(500),
        };

        let started = tokio::time::Instant::now();
        let outcome = process_requests(&rows, &options).await;
        assert!(matches!(outcome, ProcessOutcome::Manifest(_)));
        assert!(started.elapsed() >= Duration::from_millis(500));
    }
}
