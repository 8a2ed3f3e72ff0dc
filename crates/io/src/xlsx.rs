// Excel export (xlsx only)
//
// One worksheet: bold, frozen header row, then the rows with typed cells.
// Numbers stay numbers and booleans stay booleans; empty cells are skipped.

use rust_xlsxwriter::{Format, Workbook};

use tabula_core::Value;

/// Excel sheet limits
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

pub fn write(headers: &[String], rows: &[Vec<Value>], sheet_name: Option<&str>) -> Result<Vec<u8>, String> {
    if rows.len() + 1 > MAX_ROWS {
        return Err(format!("{} rows exceed the Excel limit of {}", rows.len(), MAX_ROWS - 1));
    }
    let width = rows.iter().map(Vec::len).chain(std::iter::once(headers.len())).max().unwrap_or(0);
    if width > MAX_COLS {
        return Err(format!("{} columns exceed the Excel limit of {}", width, MAX_COLS));
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    if let Some(name) = sheet_name {
        worksheet
            .set_name(name)
            .map_err(|e| format!("Failed to name sheet '{}': {}", name, e))?;
    }

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }
    if !headers.is_empty() {
        worksheet
            .set_freeze_panes(1, 0)
            .map_err(|e| format!("Failed to freeze header: {}", e))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let row32 = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col16 = col as u16;
            let written = match cell {
                Value::Empty => continue,
                Value::Bool(b) => worksheet.write_boolean(row32, col16, *b),
                Value::Number(n) if n.is_finite() => worksheet.write_number(row32, col16, *n),
                Value::Number(n) => worksheet.write_string(row32, col16, n.to_string()),
                Value::Text(s) => worksheet.write_string(row32, col16, s),
            };
            written.map_err(|e| format!("Failed to write cell ({}, {}): {}", row32, col16, e))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to build XLSX file: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, Xlsx};
    use std::io::Cursor;

    fn read_back(bytes: Vec<u8>) -> (Vec<String>, calamine::Range<Data>) {
        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let names = workbook.sheet_names().to_vec();
        let range = workbook.worksheet_range(&names[0]).unwrap();
        (names, range)
    }

    #[test]
    fn test_typed_cells_read_back() {
        let headers = vec!["Job".to_string(), "Bid".to_string(), "Open".to_string()];
        let rows = vec![
            vec![Value::from("Logo"), Value::from(500i64), Value::from(true)],
            vec![Value::from("Site"), Value::Empty, Value::from(false)],
        ];

        let (names, range) = read_back(write(&headers, &rows, Some("Proposals")).unwrap());

        assert_eq!(names, vec!["Proposals".to_string()]);
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Job".into())));
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(500.0)));
        assert_eq!(range.get_value((1, 2)), Some(&Data::Bool(true)));
        assert_eq!(range.get_value((2, 1)), Some(&Data::Empty));
    }

    #[test]
    fn test_header_only_workbook() {
        let (_, range) = read_back(write(&["Job".to_string()], &[], None).unwrap());
        assert_eq!(range.height(), 1);
    }

    #[test]
    fn test_invalid_sheet_name_is_an_error() {
        let err = write(&[], &[], Some("bad/name")).unwrap_err();
        assert!(err.contains("bad/name"));
    }
}
