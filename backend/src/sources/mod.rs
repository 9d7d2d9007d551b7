//! Master data acquisition.
//!
//! Master data arrives as a local file or from a URL. Both are read
//! asynchronously, decoded to text and handed to the parser by the caller.
//!
//! ```text
//! ┌──────────┐   ┌──────────┐     ┌──────────────┐     ┌──────────┐
//! │   File   │   │   URL    │────▶│ decode bytes │────▶│  Parser  │
//! │ (tokio)  │──▶│ (reqwest)│     │  (chardet)   │     │          │
//! └──────────┘   └──────────┘     └──────────────┘     └──────────┘
//! ```

use std::path::Path;

use crate::error::{InputFormatError, IoError, IoResult, SessionResult};
use crate::parser::{decode_content, detect_encoding};

/// Decode raw master data to text, detecting the encoding.
pub fn decode_master_bytes(bytes: &[u8]) -> String {
    let encoding = detect_encoding(bytes);
    decode_content(bytes, &encoding)
}

/// Read and decode a master data file.
pub async fn read_master_file(path: impl AsRef<Path>) -> IoResult<String> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| IoError::FileRead(format!("{}: {}", path.display(), e)))?;
    Ok(decode_master_bytes(&bytes))
}

/// Fetch and decode master data from a URL.
pub async fn fetch_master_url(url: &str) -> SessionResult<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(InputFormatError::EmptyInput.into());
    }

    let response = reqwest::get(url)
        .await
        .map_err(|e| IoError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(IoError::FetchStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        }
        .into());
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| IoError::Fetch(e.to_string()))?;
    Ok(decode_master_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_decode_strips_bom() {
        let text = decode_master_bytes("\u{feff}BRAND,STYLE #,DESCRIPTION\nNIKE,AB1,Air".as_bytes());
        assert!(text.starts_with("BRAND"));

        let parsed = crate::parser::parse_master_data(&text).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }

    #[tokio::test]
    async fn test_read_master_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "BRAND,STYLE #,DESCRIPTION\nNIKE,AB1234,Air Max\n").unwrap();

        let text = read_master_file(file.path()).await.unwrap();
        assert!(text.contains("AB1234"));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let result = read_master_file("/definitely/not/here.csv").await;
        assert!(matches!(result, Err(IoError::FileRead(_))));
    }

    #[tokio::test]
    async fn test_empty_url_is_input_error() {
        let result = fetch_master_url("   ").await;
        assert!(matches!(
            result,
            Err(SessionError::InputFormat(InputFormatError::EmptyInput))
        ));
    }
}
