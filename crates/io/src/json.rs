// JSON export

use tabula_core::Value;

/// Export as a JSON array of arrays: the header row, then one array per row.
/// Cells keep their type (numbers, booleans, strings; empty cells are null).
pub fn write(headers: &[String], rows: &[Vec<Value>]) -> Result<Vec<u8>, String> {
    let mut table: Vec<serde_json::Value> = Vec::with_capacity(rows.len() + 1);
    table.push(serde_json::to_value(headers).map_err(|e| e.to_string())?);
    for row in rows {
        table.push(serde_json::to_value(row).map_err(|e| e.to_string())?);
    }
    serde_json::to_vec_pretty(&table).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_export() {
        let headers = vec!["Name".to_string(), "Value".to_string(), "Active".to_string()];
        let rows = vec![
            vec![Value::from("Alice"), Value::from(42i64), Value::from(true)],
            vec![Value::from("Bob"), Value::Empty, Value::from(false)],
        ];

        let bytes = write(&headers, &rows).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            parsed,
            json!([
                ["Name", "Value", "Active"],
                ["Alice", 42.0, true],
                ["Bob", null, false]
            ])
        );
    }

    #[test]
    fn test_json_header_only() {
        let bytes = write(&["Job".to_string()], &[]).unwrap();
        let parsed: Vec<Vec<String>> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, vec![vec!["Job".to_string()]]);
    }
}
