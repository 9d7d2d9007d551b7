//! Row-set transformations.
//!
//! This module holds the pure engines over the row set:
//! - Consistency: cross-row store assignment rules
//! - View: filtering, sorting and highlighting
//! - Processor: sorted transfer manifest
//! - Grouper: manifest blocks by sender and receiver
//! - Statistics: per-sender totals and the sender × receiver matrix

pub mod consistency;
pub mod grouper;
pub mod processor;
pub mod statistics;
pub mod view;

pub use consistency::{disabled_stores, routing_conflicts, select_store, DisabledStores, RoutingConflict, Selection};
pub use grouper::group_manifest;
pub use processor::{build_manifest, preflight, process_requests, Preflight, ProcessOptions, ProcessOutcome};
pub use statistics::aggregate;
