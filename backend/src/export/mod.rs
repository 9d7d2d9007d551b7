//! CSV export of the processed manifest and of the saved progress table.
//!
//! # Manifest
//!
//! ```text
//! ID,Brand,Style #,Description,Sender,Receiver,Note
//! 3,NIKE,AB1,AIR MAX,AL,BR,SEND 6
//! 1,PUMA,P1,,AL,BR,
//! ,,,,,,                                  <- receiver changes
//! 2,NIKE,AB2,,AL,CW,
//! ,,,,,,                                  <- sender changes
//! 4,NIKE,AB3,,BR,AL,
//! ```

use std::io::{self, Write};

use csv::{QuoteStyle, WriterBuilder};

use crate::models::{ProcessedRequest, TableRow};
use crate::transform::grouper::boundaries;

pub const MANIFEST_HEADER: [&str; 7] = ["ID", "Brand", "Style #", "Description", "Sender", "Receiver", "Note"];

pub const PROGRESS_HEADER: &str = "BRAND,STYLE #,DESCRIPTION,FROM,TO,NOTE";

const SPACER: [&str; 7] = [""; 7];

/// Write a sorted manifest with spacer records between sender and
/// receiver blocks.
pub fn write_manifest_csv<W: Write>(writer: W, requests: &[ProcessedRequest]) -> csv::Result<()> {
    let mut csv = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(writer);

    csv.write_record(MANIFEST_HEADER)?;

    for (request, boundary) in requests.iter().zip(boundaries(requests)) {
        if boundary.needs_spacer() {
            csv.write_record(SPACER)?;
        }
        let display_id = request.display_id.to_string();
        csv.write_record([
            display_id.as_str(),
            request.brand.as_str(),
            request.style.as_str(),
            request.description.as_str(),
            request.sender.as_str(),
            request.receiver.as_str(),
            request.note.as_str(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Write progress rows with every field quoted.
pub fn write_progress_csv<W: Write>(mut writer: W, rows: &[TableRow]) -> csv::Result<()> {
    writeln!(writer, "{}", PROGRESS_HEADER)?;

    let mut csv = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .has_headers(false)
        .from_writer(writer);

    for row in rows {
        csv.write_record([
            row.brand.to_uppercase().as_str(),
            row.style.as_str(),
            row.description.to_uppercase().as_str(),
            row.from.as_str(),
            row.to.as_str(),
            row.resolved_note(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

fn into_string(buffer: Vec<u8>) -> csv::Result<String> {
    String::from_utf8(buffer)
        .map_err(|e| csv::Error::from(io::Error::new(io::ErrorKind::InvalidData, e)))
}

pub fn manifest_to_string(requests: &[ProcessedRequest]) -> csv::Result<String> {
    let mut buffer = Vec::new();
    write_manifest_csv(&mut buffer, requests)?;
    into_string(buffer)
}

pub fn progress_to_string(rows: &[TableRow]) -> csv::Result<String> {
    let mut buffer = Vec::new();
    write_progress_csv(&mut buffer, rows)?;
    into_string(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OTHER_NOTE;

    fn request(display_id: u64, brand: &str, sender: &str, receiver: &str) -> ProcessedRequest {
        ProcessedRequest {
            id: display_id,
            display_id,
            brand: brand.into(),
            style: format!("S{}", display_id),
            description: String::new(),
            sender: sender.into(),
            receiver: receiver.into(),
            note: String::new(),
        }
    }

    #[test]
    fn test_manifest_spacers() {
        let requests = vec![
            request(1, "NIKE", "AL", "BR"),
            request(2, "NIKE", "AL", "BR"),
            request(3, "NIKE", "AL", "CW"),
            request(4, "NIKE", "BR", "CW"),
        ];

        let csv = manifest_to_string(&requests).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "ID,Brand,Style #,Description,Sender,Receiver,Note",
                "1,NIKE,S1,,AL,BR,",
                "2,NIKE,S2,,AL,BR,",
                ",,,,,,",
                "3,NIKE,S3,,AL,CW,",
                ",,,,,,",
                "4,NIKE,S4,,BR,CW,",
            ]
        );
    }

    #[test]
    fn test_manifest_quotes_are_doubled() {
        let mut req = request(7, "BRAND \"X\", INC", "AL", "BR");
        req.note = "say \"hi\"".into();

        let csv = manifest_to_string(&[req]).unwrap();
        assert!(csv.contains("\"BRAND \"\"X\"\", INC\""));
        assert!(csv.contains("\"say \"\"hi\"\"\""));
    }

    #[test]
    fn test_manifest_uses_display_id() {
        let mut req = request(3, "NIKE", "AL", "BR");
        req.id = 99;
        let csv = manifest_to_string(&[req]).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("3,"));
    }

    #[test]
    fn test_empty_manifest_has_header_only() {
        let csv = manifest_to_string(&[]).unwrap();
        assert_eq!(csv, "ID,Brand,Style #,Description,Sender,Receiver,Note\n");
    }

    #[test]
    fn test_progress_export() {
        let mut row = TableRow::new(1, "AB1");
        row.brand = "nike".into();
        row.description = "air \"max\"".into();
        row.from = "AL".into();
        row.note = OTHER_NOTE.into();
        row.custom_note = "handle with care".into();

        let csv = progress_to_string(&[row, TableRow::new(2, "X1")]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], PROGRESS_HEADER);
        assert_eq!(lines[1], "\"NIKE\",\"AB1\",\"AIR \"\"MAX\"\"\",\"AL\",\"\",\"handle with care\"");
        assert_eq!(lines[2], "\"\",\"X1\",\"\",\"\",\"\",\"\"");
    }
}
