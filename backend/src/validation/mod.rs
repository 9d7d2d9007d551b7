//! JSON Schema validation for persisted records.
//!
//! Saved records are read back from a key-value store that anything could
//! have written to, so their shape is checked before they replace live state.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from `schemas/` directory:
//! - `progress-snapshot.json` (array of table rows)
//! - `store-codes.json` (array of store codes)
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use stocktransfer::validation::{is_valid_store_codes, validate_progress_snapshot};
//!
//! assert!(is_valid_store_codes(&json!(["AL", "BR"])));
//! assert!(validate_progress_snapshot(&json!([{ "id": 1 }])).is_err());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

static PROGRESS_SNAPSHOT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/progress-snapshot.json"))
        .expect("Invalid embedded schema")
});

static STORE_CODES_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/store-codes.json"))
        .expect("Invalid embedded schema")
});

/// Validate `data` against a draft 7 schema.
///
/// Returns every validation error as a message.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate a saved row set.
pub fn validate_progress_snapshot(data: &Value) -> Result<(), Vec<String>> {
    validate(&PROGRESS_SNAPSHOT_SCHEMA, data)
}

pub fn is_valid_progress_snapshot(data: &Value) -> bool {
    is_valid(&PROGRESS_SNAPSHOT_SCHEMA, data)
}

/// Validate a saved store registry.
pub fn validate_store_codes(data: &Value) -> Result<(), Vec<String>> {
    validate(&STORE_CODES_SCHEMA, data)
}

pub fn is_valid_store_codes(data: &Value) -> bool {
    is_valid(&STORE_CODES_SCHEMA, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_snapshot() {
        let data = json!([{
            "id": 1,
            "displayId": 1,
            "brand": "NIKE",
            "style": "AB1234",
            "description": "AIR MAX",
            "from": "AL",
            "to": "",
            "note": "Other",
            "customNote": "fragile"
        }]);
        assert!(validate_progress_snapshot(&data).is_ok());
    }

    #[test]
    fn test_custom_note_optional() {
        let data = json!([{
            "id": 1, "displayId": 1, "brand": "", "style": "X",
            "description": "", "from": "", "to": "", "note": ""
        }]);
        assert!(is_valid_progress_snapshot(&data));
        assert!(is_valid_progress_snapshot(&json!([])));
    }

    #[test]
    fn test_malformed_snapshot() {
        assert!(!is_valid_progress_snapshot(&json!({ "rows": [] })));

        let errors = validate_progress_snapshot(&json!([{ "id": "one", "style": "X" }])).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_id_above_cap() {
        let row = |id: u64| {
            json!([{
                "id": id, "displayId": 1, "brand": "", "style": "X",
                "description": "", "from": "", "to": "", "note": ""
            }])
        };
        assert!(is_valid_progress_snapshot(&row(9_007_199_254_740_991)));
        assert!(!is_valid_progress_snapshot(&row(9_007_199_254_740_992)));
        assert!(!is_valid_progress_snapshot(&row(u64::MAX)));
    }

    #[test]
    fn test_store_codes() {
        assert!(is_valid_store_codes(&json!(["AL", "BR"])));
        assert!(!is_valid_store_codes(&json!(["AL", "AL"])));
        assert!(!is_valid_store_codes(&json!(["AL", 3])));
        assert!(validate_store_codes(&json!("AL")).is_err());
    }

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
        assert!(validate(&schema, &json!({ "age": 42 })).is_err());
    }
}
