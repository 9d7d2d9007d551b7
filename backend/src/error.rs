//! Error types for the transfer-request engine.
//!
//! The hierarchy follows the way failures surface to the user:
//!
//! - [`InputFormatError`] - master data, style lists or saved state with a bad shape
//! - [`IoError`] - fetch, file read and key-value store failures
//! - [`ScanDeviceError`] - the scanner could not be started
//! - [`ScanRuntimeError`] - the decode pipeline failed after a successful start
//! - [`SelectionError`] - a store selection was refused by the consistency rules
//! - [`StoreRegistryError`] - store registry edits that were refused
//! - [`SessionError`] - top-level controller errors
//!
//! Conversion into [`SessionError`] is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::models::StoreField;

// =============================================================================
// Input Format Errors
// =============================================================================

/// Errors caused by input whose shape cannot be used.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputFormatError {
    /// Nothing to parse.
    #[error("Input is empty")]
    EmptyInput,

    /// Header line does not carry the required columns.
    #[error("Header must contain \"BRAND\", \"STYLE #\" (or \"STYLE\"), and \"DESCRIPTION\" (missing: {})", .missing.join(", "))]
    HeaderInvalid { missing: Vec<String> },

    /// Every data line was skipped.
    #[error("All {skipped} data rows were skipped due to formatting errors or missing data")]
    NoValidRows { skipped: usize },

    /// Saved progress does not have the expected shape.
    #[error("Saved progress is not in the correct format: {}", .0.join("; "))]
    MalformedSnapshot(Vec<String>),

    /// Saved store list does not have the expected shape.
    #[error("Saved store list is not in the correct format: {}", .0.join("; "))]
    MalformedStoreList(Vec<String>),

    /// New rows would need ids above the storable maximum.
    #[error("Cannot add {requested} row(s): ids above {max} cannot be saved")]
    IdsExhausted { requested: usize, max: u64 },

    /// Content could not be decoded to text.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

// =============================================================================
// IO Errors
// =============================================================================

/// Errors at the IO boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IoError {
    /// Network request failed before a response arrived.
    #[error("Could not fetch data from URL. Details: {0}")]
    Fetch(String),

    /// Server answered with a non-success status.
    #[error("Failed to fetch data: {status} {reason}")]
    FetchStatus { status: u16, reason: String },

    /// Local file could not be read.
    #[error("Error reading file: {0}")]
    FileRead(String),

    /// Key-value store could not be read.
    #[error("Failed to read saved data: {0}")]
    StorageRead(String),

    /// Key-value store rejected a write (full disk, permissions).
    #[error("Failed to save data. Storage might be full: {0}")]
    StorageWrite(String),
}

// =============================================================================
// Scan Errors
// =============================================================================

/// Errors raised while starting the scanner.
///
/// The display text is the remediation message shown to the user.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScanDeviceError {
    #[error("Camera permission denied. Please grant camera access to use the scanner.")]
    PermissionDenied,

    #[error("No camera found. Please ensure a camera is connected and enabled.")]
    NoCamera,

    #[error("The camera is already in use by another application.")]
    CameraBusy,

    #[error("Could not start the camera. Please ensure it is not in use by another application. ({0})")]
    Unavailable(String),
}

impl ScanDeviceError {
    /// Map a device error name (as reported by media stacks) to a cause.
    pub fn from_device_name(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => Self::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" => Self::NoCamera,
            "NotReadableError" => Self::CameraBusy,
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Failure of the decode pipeline after the scanner started.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScanRuntimeError {
    #[error("An unexpected error occurred during scanning. The scanner has been stopped.")]
    Decode(String),
}

// =============================================================================
// Selection Errors
// =============================================================================

/// Errors from store selection on a row.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Row {0} not found")]
    RowNotFound(u64),

    #[error("Store {code} cannot be selected as '{field}' for this style")]
    Refused { code: String, field: StoreField },
}

// =============================================================================
// Store Registry Errors
// =============================================================================

/// Refused store registry edits.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreRegistryError {
    #[error("Store name cannot be empty.")]
    EmptyName,

    #[error("Store \"{0}\" already exists.")]
    AlreadyExists(String),

    #[error("Store \"{0}\" is currently being used in a transfer request.")]
    InUse(String),

    #[error("Store \"{0}\" not found.")]
    NotFound(String),
}

// =============================================================================
// Session Errors (top-level)
// =============================================================================

/// Top-level controller errors.
///
/// This is the error type returned by [`crate::session::TransferSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InputFormat(#[from] InputFormatError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    ScanDevice(#[from] ScanDeviceError),

    #[error(transparent)]
    ScanRuntime(#[from] ScanRuntimeError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    StoreRegistry(#[from] StoreRegistryError),

    /// Nothing saved under the progress key.
    #[error("No saved progress found.")]
    NoSavedProgress,

    /// An overwrite or proceed-anyway gate was not confirmed.
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parsing operations.
pub type InputResult<T> = Result<T, InputFormatError>;

/// Result type for IO boundary operations.
pub type IoResult<T> = Result<T, IoError>;

/// Result type for store registry operations.
pub type RegistryResult<T> = Result<T, StoreRegistryError>;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let input_err = InputFormatError::NoValidRows { skipped: 3 };
        let session_err: SessionError = input_err.into();
        assert!(session_err.to_string().contains("All 3 data rows"));

        let io_err = IoError::StorageWrite("quota exceeded".into());
        let session_err: SessionError = io_err.into();
        assert!(session_err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_header_invalid_lists_missing_columns() {
        let err = InputFormatError::HeaderInvalid {
            missing: vec!["description".into()],
        };
        assert!(err.to_string().contains("missing: description"));
    }

    #[test]
    fn test_device_error_from_name() {
        assert_eq!(
            ScanDeviceError::from_device_name("PermissionDeniedError"),
            ScanDeviceError::PermissionDenied
        );
        assert_eq!(
            ScanDeviceError::from_device_name("DevicesNotFoundError"),
            ScanDeviceError::NoCamera
        );
        assert_eq!(
            ScanDeviceError::from_device_name("NotReadableError"),
            ScanDeviceError::CameraBusy
        );
        assert!(matches!(
            ScanDeviceError::from_device_name("OverconstrainedError"),
            ScanDeviceError::Unavailable(_)
        ));
    }

    #[test]
    fn test_refused_selection_message() {
        let err = SelectionError::Refused {
            code: "A".into(),
            field: StoreField::To,
        };
        assert!(err.to_string().contains("'to'"));
    }
}
