//! # Stocktransfer - store-to-store inventory transfer requests
//!
//! Stocktransfer turns lists of style codes into a sorted, grouped manifest
//! of which store sends which style to which other store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Master CSV  │────▶│   Parser    │────▶│   Ingest    │────▶│  Row set    │
//! │ (file/URL)  │     │ (auto-enc)  │     │ (enrich)    │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//!                     ┌─────────────┐     ┌─────────────┐            │
//!                     │ Manifest CSV│◀────│  Processor  │◀───────────┤
//!                     └─────────────┘     └─────────────┘            │
//!                                         ┌─────────────┐            │
//!                                         │ Statistics  │◀───────────┘
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stocktransfer::{MemoryStore, ProcessOptions, ProcessOutcome, TransferSession};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut session = TransferSession::new(Arc::new(MemoryStore::new()));
//!     session.import_master_text("BRAND,STYLE #,DESCRIPTION\nNIKE,AB1234,Air Max").unwrap();
//!     session.set_input("ab1234");
//!     session.load_styles().unwrap();
//!     session.select_from(1, "AL").unwrap();
//!     session.select_to(1, "BR").unwrap();
//!
//!     if let ProcessOutcome::Manifest(manifest) = session.process(&ProcessOptions::default()).await {
//!         println!("{}", stocktransfer::manifest_to_string(&manifest).unwrap());
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Environment configuration and constants
//! - [`models`] - Domain models (TableRow, ProcessedRequest, StatisticsSnapshot)
//! - [`parser`] - Master data parsing with encoding detection
//! - [`ingest`] - Style list ingestion
//! - [`transform`] - Consistency rules, views, processing, statistics
//! - [`export`] - CSV export
//! - [`validation`] - Persisted record schema validation
//! - [`persistence`] - Key-value storage
//! - [`stores`] - Store registry
//! - [`sources`] - Master data file and URL reading
//! - [`scan`] - Barcode scan stream
//! - [`notify`] - Transient notifications
//! - [`session`] - Application controller

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Notifications
pub mod notify;

// Parsing & ingestion
pub mod ingest;
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;

// Validation & storage
pub mod persistence;
pub mod validation;

// Boundaries
pub mod scan;
pub mod sources;
pub mod stores;

// Controller
pub mod session;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    InputFormatError,
    IoError,
    ScanDeviceError,
    ScanRuntimeError,
    SelectionError,
    SessionError,
    StoreRegistryError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ProcessedRequest,
    SenderStats,
    StatisticsSnapshot,
    StoreField,
    StyleMasterRecord,
    TableRow,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{parse_master_data, MasterLookup, MasterParseResult};
pub use ingest::{ingest_styles, IngestResult};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    aggregate,
    build_manifest,
    group_manifest,
    process_requests,
    ProcessOptions,
    ProcessOutcome,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{manifest_to_string, progress_to_string, write_manifest_csv, write_progress_csv};

// =============================================================================
// Re-exports - Storage & Session
// =============================================================================

pub use config::AppConfig;
pub use persistence::{FileStore, KeyValueStore, MemoryStore};
pub use session::{BulkEdit, BulkReport, Confirmation, TransferSession};
pub use stores::StoreRegistry;
