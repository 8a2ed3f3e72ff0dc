// CSV export and read-back

use csv::{QuoteStyle, Terminator};

use tabula_config::LineEnding;
use tabula_core::Value;

use crate::table::TableData;

/// Write header + rows as CSV.
///
/// Every field is quoted and inner quotes are doubled. Records are joined by
/// `line_ending`; there is no terminator after the last record. Rows may be
/// ragged. A record with no fields is an empty line.
pub fn write(headers: &[String], rows: &[Vec<Value>], line_ending: LineEnding) -> Result<Vec<u8>, String> {
    let end = line_ending.as_str().as_bytes();
    let mut bytes = encode_record(headers.iter().map(String::as_str))?;
    for row in rows {
        bytes.extend_from_slice(end);
        bytes.extend(encode_record(row.iter().map(Value::display_string))?);
    }
    Ok(bytes)
}

/// One record without its terminator. The csv writer quotes a lone empty
/// record as `""`, which would read back as one blank field, so zero fields
/// encode to nothing.
fn encode_record<I, T>(fields: I) -> Result<Vec<u8>, String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut fields = fields.into_iter().peekable();
    if fields.peek().is_none() {
        return Ok(Vec::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .buffer_capacity(1024)
        .from_writer(Vec::new());
    writer.write_record(fields).map_err(|e| e.to_string())?;

    let mut bytes = writer.into_inner().map_err(|e| e.to_string())?;
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    Ok(bytes)
}

/// Parse CSV bytes back into a table. The first record is the header row;
/// every cell comes back as text (empty cells as [`Value::Empty`]).
pub fn read(bytes: &[u8]) -> Result<TableData, String> {
    let content = decode(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers = match records.next() {
        Some(record) => record.map_err(|e| e.to_string())?.iter().map(str::to_string).collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|e| e.to_string())?;
        rows.push(
            record
                .iter()
                .map(|field| if field.is_empty() { Value::Empty } else { Value::from(field) })
                .collect(),
        );
    }

    Ok(TableData::new(headers, rows))
}

/// UTF-8 (BOM stripped), falling back to Windows-1252 for Excel-made files
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.strip_prefix('\u{feff}').unwrap_or(s).to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
