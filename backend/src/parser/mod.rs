//! Master-data parser with encoding and delimiter detection.
//!
//! Converts CSV/TSV master data (columns `BRAND`, `STYLE #` or `STYLE`,
//! `DESCRIPTION`, in any order) into [`StyleMasterRecord`]s. Malformed lines
//! are skipped and counted rather than failing the whole import.

use crate::error::{InputFormatError, InputResult};
use crate::models::StyleMasterRecord;

/// Result of parsing master data.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterParseResult {
    /// Parsed records, in file order
    pub records: Vec<StyleMasterRecord>,
    /// Delimiter chosen from the header line
    pub delimiter: char,
    /// Data lines (after the header) that were looked at
    pub total_rows: usize,
    /// Data lines that were skipped
    pub skipped: usize,
}

impl MasterParseResult {
    /// User-facing summary of the import.
    pub fn summary(&self) -> String {
        let mut message = format!(
            "Successfully loaded {} styles as the data source.",
            self.records.len()
        );
        if self.skipped > 0 {
            message.push_str(&format!(
                " {} row(s) were skipped due to errors.",
                self.skipped
            ));
        }
        message
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        _ => String::from_utf8_lossy(bytes).to_string(),
    };

    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Tab if the header line contains one, comma otherwise.
pub fn detect_delimiter(header_line: &str) -> char {
    if header_line.contains('\t') {
        '\t'
    } else {
        ','
    }
}

/// Split a line on `delimiter`, ignoring delimiters inside double quotes.
///
/// Quote characters are kept; [`clean_field`] removes them.
pub fn split_quoted(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
            current.push(c);
        } else if c == delimiter && !in_quotes {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);

    fields
}

/// Trim, strip the outer quotes, unescape doubled quotes, upper-case.
pub fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    let quoted = trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"');

    let inner = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let inner = inner.strip_suffix('"').unwrap_or(inner);

    let value = if quoted {
        inner.replace("\"\"", "\"")
    } else {
        inner.to_string()
    };

    value.trim().to_uppercase()
}

fn split_line(line: &str, delimiter: char) -> Vec<String> {
    if delimiter == '\t' {
        line.split('\t').map(str::to_string).collect()
    } else {
        split_quoted(line, delimiter)
    }
}

/// Column positions resolved from the header.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeaderColumns {
    brand: usize,
    style: usize,
    description: usize,
}

impl HeaderColumns {
    fn resolve(header_line: &str, delimiter: char) -> InputResult<Self> {
        let headers: Vec<String> = split_line(&header_line.to_lowercase(), delimiter)
            .iter()
            .map(|h| {
                let h = h.trim();
                let h = h.strip_prefix('"').unwrap_or(h);
                h.strip_suffix('"').unwrap_or(h).trim().to_string()
            })
            .collect();

        let style = headers.iter().position(|h| h == "style #" || h == "style");
        let brand = headers.iter().position(|h| h == "brand");
        let description = headers.iter().position(|h| h == "description");

        match (brand, style, description) {
            (Some(brand), Some(style), Some(description)) => Ok(Self {
                brand,
                style,
                description,
            }),
            _ => {
                let mut missing = Vec::new();
                if brand.is_none() {
                    missing.push("brand".to_string());
                }
                if style.is_none() {
                    missing.push("style #".to_string());
                }
                if description.is_none() {
                    missing.push("description".to_string());
                }
                Err(InputFormatError::HeaderInvalid { missing })
            }
        }
    }

    fn max_index(&self) -> usize {
        self.brand.max(self.style).max(self.description)
    }
}

/// Parse master data text into records.
///
/// # Example
/// ```ignore
/// use stocktransfer::parse_master_data;
///
/// let result = parse_master_data("BRAND,STYLE #,DESCRIPTION\nNIKE,AB1234,Air Max").unwrap();
/// assert_eq!(result.records[0].description, "AIR MAX");
/// ```
pub fn parse_master_data(text: &str) -> InputResult<MasterParseResult> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = normalized.lines().filter(|line| !line.trim().is_empty());

    let header_line = lines.next().ok_or(InputFormatError::EmptyInput)?.trim();
    let delimiter = detect_delimiter(header_line);
    let columns = HeaderColumns::resolve(header_line, delimiter)?;

    let mut records = Vec::new();
    let mut total_rows = 0;

    for line in lines {
        total_rows += 1;

        let parts = split_line(line, delimiter);
        if parts.len() <= columns.max_index() {
            continue;
        }

        let brand = clean_field(&parts[columns.brand]);
        let style = clean_field(&parts[columns.style]);
        let description = clean_field(&parts[columns.description]);

        if brand.is_empty() || style.is_empty() {
            continue;
        }

        records.push(StyleMasterRecord {
            brand,
            style,
            description,
        });
    }

    let skipped = total_rows - records.len();
    if records.is_empty() {
        return Err(InputFormatError::NoValidRows { skipped });
    }

    Ok(MasterParseResult {
        records,
        delimiter,
        total_rows,
        skipped,
    })
}

// =============================================================================
// Lookup
// =============================================================================

/// In-memory master data keyed by style.
///
/// Styles are not guaranteed unique in the source; the first record wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterLookup {
    records: Vec<StyleMasterRecord>,
}

impl MasterLookup {
    pub fn new(records: Vec<StyleMasterRecord>) -> Self {
        Self { records }
    }

    /// Case-insensitive exact match on style; first match wins.
    pub fn find(&self, style: &str) -> Option<&StyleMasterRecord> {
        let wanted = style.to_uppercase();
        self.records.iter().find(|r| r.style == wanted)
    }

    /// Replace the whole lookup (re-import never merges).
    pub fn replace(&mut self, records: Vec<StyleMasterRecord>) {
        self.records = records;
    }

    pub fn records(&self) -> &[StyleMasterRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_master_data() {
        let result = parse_master_data("BRAND,STYLE #,DESCRIPTION\nNIKE,AB1234,Air Max").unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.delimiter, ',');
        assert_eq!(
            result.records[0],
            StyleMasterRecord::new("NIKE", "AB1234", "AIR MAX")
        );
    }

    #[test]
    fn test_columns_in_any_order_and_style_alias() {
        let csv = "Description,Style,Brand\nRunner,x1,adidas";
        let result = parse_master_data(csv).unwrap();

        assert_eq!(result.records[0].brand, "ADIDAS");
        assert_eq!(result.records[0].style, "X1");
        assert_eq!(result.records[0].description, "RUNNER");
    }

    #[test]
    fn test_tab_delimiter() {
        let tsv = "BRAND\tSTYLE #\tDESCRIPTION\nNIKE\tCW9610 010\tTee, cotton";
        let result = parse_master_data(tsv).unwrap();

        assert_eq!(result.delimiter, '\t');
        assert_eq!(result.records[0].style, "CW9610 010");
        assert_eq!(result.records[0].description, "TEE, COTTON");
    }

    #[test]
    fn test_quoted_values_with_commas() {
        let csv = "BRAND,STYLE #,DESCRIPTION\r\n\"NIKE\",AB1,\"Shoe, \"\"Air\"\" Max\"\r\n";
        let result = parse_master_data(csv).unwrap();

        assert_eq!(result.records[0].brand, "NIKE");
        assert_eq!(result.records[0].description, "SHOE, \"AIR\" MAX");
    }

    #[test]
    fn test_short_and_empty_lines_skipped() {
        let csv = "BRAND,STYLE #,DESCRIPTION\nNIKE,AB1\n\n,AB2,Missing brand\nNIKE,,No style\nPUMA,P1,Suede";
        let result = parse_master_data(csv).unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.total_rows, 4);
        assert_eq!(result.skipped, 3);
        assert!(result.summary().contains("3 row(s) were skipped"));
    }

    #[test]
    fn test_missing_description_header() {
        let err = parse_master_data("BRAND,STYLE #\nNIKE,AB1").unwrap_err();
        assert_eq!(
            err,
            InputFormatError::HeaderInvalid {
                missing: vec!["description".to_string()]
            }
        );
    }

    #[test]
    fn test_all_rows_skipped() {
        let err = parse_master_data("BRAND,STYLE,DESCRIPTION\n,,\nX").unwrap_err();
        assert_eq!(err, InputFormatError::NoValidRows { skipped: 2 });
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            parse_master_data("  \n\n").unwrap_err(),
            InputFormatError::EmptyInput
        );
    }

    #[test]
    fn test_split_quoted_keeps_commas_inside_quotes() {
        let parts = split_quoted(r#"a,"b,c",d"#, ',');
        assert_eq!(parts, vec!["a", "\"b,c\"", "d"]);
    }

    #[test]
    fn test_lookup_first_match_wins() {
        let lookup = MasterLookup::new(vec![
            StyleMasterRecord::new("NIKE", "AB1", "FIRST"),
            StyleMasterRecord::new("NIKE", "AB1", "SECOND"),
        ]);
        assert_eq!(lookup.find("ab1").unwrap().description, "FIRST");
        assert!(lookup.find("ZZ").is_none());
    }

    #[test]
    fn test_reimport_replaces_lookup() {
        let csv = "BRAND,STYLE,DESCRIPTION\nNIKE,AB1,Air";
        let mut lookup = MasterLookup::default();

        lookup.replace(parse_master_data(csv).unwrap().records);
        let first = lookup.clone();
        lookup.replace(parse_master_data(csv).unwrap().records);

        assert_eq!(lookup, first);
        assert_eq!(lookup.len(), 1);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert!(decoded.contains("Soci"));
    }
}
