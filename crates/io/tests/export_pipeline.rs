use std::collections::BTreeMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use tabula_config::{LineEnding, TableSettings};
use tabula_core::{record, Column, Record, Value};
use tabula_engine::{apply, ColumnVisibility, QueryState, Selection};
use tabula_io::{read_csv, serialize, table_source, ExportError, ExportFormat, ExportOptions};

type Row = BTreeMap<String, Value>;

fn columns() -> Vec<Column<Row>> {
    vec![
        Column::new("jobTitle", "Job Title").sortable(),
        Column::new("clientName", "Client").sortable(),
        Column::new("bidAmount", "Bid").sortable(),
        Column::action("actions", "Actions", |_: &Row| "Withdraw".to_string()),
    ]
}

fn proposals() -> Vec<Row> {
    vec![
        record([
            ("id", Value::from("p1")),
            ("jobTitle", Value::from("Logo, brand kit")),
            ("clientName", Value::from("Acme \"Rockets\"")),
            ("bidAmount", Value::from(500i64)),
        ]),
        record([
            ("id", Value::from("p2")),
            ("jobTitle", Value::from("Landing page\nwith form")),
            ("clientName", Value::from("Globex")),
            ("bidAmount", Value::from(1250.5)),
        ]),
        record([
            ("id", Value::from("p3")),
            ("jobTitle", Value::from("Audit")),
            ("clientName", Value::Empty),
            ("bidAmount", Value::from(90i64)),
        ]),
    ]
}

#[test]
fn csv_round_trips_awkward_cells() {
    let rows = proposals();
    let refs: Vec<&Row> = rows.iter().collect();
    let table = table_source(&columns(), &refs);

    let file = table.serialize(ExportFormat::Csv, "proposals", &ExportOptions::default()).unwrap();
    let back = read_csv(&file.bytes).unwrap();

    assert_eq!(back.headers, table.headers);
    let as_text: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(Value::display_string).collect())
        .collect();
    let back_text: Vec<Vec<String>> = back
        .rows
        .iter()
        .map(|row| row.iter().map(Value::display_string).collect())
        .collect();
    assert_eq!(back_text, as_text);
    assert_eq!(back.records()[1].field("Job Title"), Value::from("Landing page\nwith form"));
}

#[test]
fn full_projection_is_byte_identical() {
    let rows = proposals();
    let refs: Vec<&Row> = rows.iter().collect();
    let table = table_source(&columns(), &refs);

    for format in [ExportFormat::Csv, ExportFormat::Json] {
        let plain = table.serialize(format, "p", &ExportOptions::default()).unwrap();
        let all = ExportOptions::default().with_visible_indices((0..table.headers.len()).collect());
        let projected = table.serialize(format, "p", &all).unwrap();
        assert_eq!(plain.bytes, projected.bytes);
    }
}

#[test]
fn hidden_columns_and_selection_shape_the_export() {
    let rows = proposals();
    let cols = columns();
    let mut visibility = ColumnVisibility::from_columns(&cols);
    visibility.toggle("clientName");

    let view = apply(&rows, &QueryState::new());
    let mut selection: Selection = Selection::new();
    selection.set_universe(view.ids(&rows));
    selection.toggle("p3".into());

    let all = table_source(&cols, &view.all_rows(&rows));
    let picked = table_source(&cols, &selection.selected_rows(&view.all_rows(&rows)));
    let options = ExportOptions::default()
        .with_visible_indices(visibility.visible_indices(&all.key_refs()))
        .with_selected_rows(picked.rows);

    let file = all.serialize(ExportFormat::Csv, "selected", &options).unwrap();
    assert_eq!(
        String::from_utf8(file.bytes).unwrap(),
        "\"Job Title\",\"Bid\"\n\"Audit\",\"90\""
    );
}

#[test]
fn zero_rows_give_header_only_files() {
    let headers = vec!["Job".to_string(), "Bid".to_string()];
    let csv = serialize(ExportFormat::Csv, &headers, &[], "empty", &ExportOptions::default()).unwrap();
    assert_eq!(csv.bytes, b"\"Job\",\"Bid\"");

    let json = serialize(ExportFormat::Json, &headers, &[], "empty", &ExportOptions::default()).unwrap();
    let parsed: Vec<Vec<String>> = serde_json::from_slice(&json.bytes).unwrap();
    assert_eq!(parsed, vec![headers]);
}

#[test]
fn all_columns_hidden_exports_no_phantom_column() {
    let rows = proposals();
    let cols = columns();
    let refs: Vec<&Row> = rows.iter().collect();
    let table = table_source(&cols, &refs);

    let mut visibility = ColumnVisibility::from_columns(&cols);
    visibility.hide_all();
    let options = ExportOptions::default().with_visible_indices(visibility.visible_indices(&table.key_refs()));

    let file = table.serialize(ExportFormat::Csv, "nothing", &options).unwrap();
    assert_eq!(file.bytes, b"\n\n\n");

    let back = read_csv(&file.bytes).unwrap();
    assert!(back.headers.is_empty());
    assert!(back.rows.iter().all(|row| row.is_empty()));
}

#[test]
fn xlsx_export_is_exact() {
    let rows = proposals();
    let refs: Vec<&Row> = rows.iter().collect();
    let table = table_source(&columns(), &refs);

    let file = table.serialize(ExportFormat::Xlsx, "proposals", &ExportOptions::default()).unwrap();
    assert_eq!(file.filename, "proposals.xlsx");
    assert!(file.warnings.is_empty());

    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(file.bytes)).unwrap();
    let sheet = workbook.sheet_names()[0].clone();
    let range = workbook.worksheet_range(&sheet).unwrap();
    assert_eq!(range.height(), 4);
    assert_eq!(range.get_value((0, 2)), Some(&Data::String("Bid".into())));
    assert_eq!(range.get_value((2, 0)), Some(&Data::String("Landing page\nwith form".into())));
    assert_eq!(range.get_value((2, 2)), Some(&Data::Float(1250.5)));
}

#[test]
fn pdf_follows_degrade_setting() {
    let headers = vec!["Job".to_string()];
    let rows = vec![vec![Value::from("Logo")]];

    let strict = ExportOptions::from_settings(&TableSettings::default());
    assert!(matches!(
        serialize(ExportFormat::Pdf, &headers, &rows, "r", &strict),
        Err(ExportError::UnsupportedFormat(ExportFormat::Pdf))
    ));

    let settings = TableSettings {
        export_degrade_unsupported: true,
        export_line_ending: LineEnding::Crlf,
        ..TableSettings::default()
    };
    let file = serialize(ExportFormat::Pdf, &headers, &rows, "r", &ExportOptions::from_settings(&settings)).unwrap();
    assert_eq!(file.filename, "r.csv");
    assert_eq!(file.warnings.len(), 1);
    assert_eq!(file.bytes, b"\"Job\"\r\n\"Logo\"");
}

#[test]
fn saved_file_lands_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    let rows = proposals();
    let refs: Vec<&Row> = rows.iter().collect();
    let file = table_source(&columns(), &refs)
        .serialize(ExportFormat::Csv, "proposals", &ExportOptions::default())
        .unwrap();

    let path = file.save_in(dir.path()).unwrap();
    assert_eq!(path, dir.path().join("proposals.csv"));
    let back = read_csv(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(back.rows.len(), 3);
}
