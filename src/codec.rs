//! Plain delimited text ↔ [`RawRecord`] conversion.
//!
//! The format is deliberately minimal: the first line names the fields, each
//! later line holds comma-separated values matched by position. Quoting is
//! switched off in both directions, so a delimiter inside a value cannot be
//! represented and quote characters pass through verbatim.

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, Trim, WriterBuilder};

use crate::error::{MergeError, Result};
use crate::model::RawRecord;

/// Field separator used on both sides of the codec.
pub const DELIMITER: u8 = b',';

/// Decoded text: the header's field names and one record per data line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

/// Parses delimited text into a header and records keyed by its names.
///
/// Values are trimmed, short lines are padded with empty strings and blank
/// or whitespace-only lines are skipped. Fields beyond the header width are
/// ignored. Text without a header line decodes to an empty table.
pub fn decode_table(text: &str) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = reader.records().filter(|row| !matches!(row, Ok(row) if is_blank(row)));
    let headers: Vec<String> = match rows.next() {
        Some(first) => first?.iter().map(str::to_string).collect(),
        None => return Ok(Table::default()),
    };

    let records = rows
        .map(|row| -> Result<RawRecord> {
            let row = row?;
            Ok(headers
                .iter()
                .enumerate()
                .map(|(position, header)| (header.as_str(), row.get(position).unwrap_or_default()))
                .collect())
        })
        .collect::<Result<Vec<RawRecord>>>()?;

    Ok(Table { headers, records })
}

/// Parses delimited text into records, discarding the header names.
pub fn decode(text: &str) -> Result<Vec<RawRecord>> {
    Ok(decode_table(text)?.records)
}

/// Serializes records using the field order of the first record as header.
///
/// Every row, the last one included, ends with a newline. A record without
/// one of the header fields contributes an empty value for it.
pub fn encode(records: &[RawRecord]) -> Result<String> {
    let first = records.first().ok_or(MergeError::EmptyInput)?;
    let headers: Vec<&str> = first.keys().collect();

    let mut writer = WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&headers)?;
    for record in records {
        writer.write_record(headers.iter().map(|header| record.get(header).unwrap_or_default()))?;
    }

    let bytes = writer.into_inner().map_err(|error| MergeError::Io(error.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|error| MergeError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, error)))
}

fn is_blank(row: &StringRecord) -> bool {
    row.iter().all(str::is_empty) && row.len() <= 1
}
